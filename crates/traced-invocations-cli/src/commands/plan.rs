//! `plan` subcommand: print the resolved deployment plan.

use std::io;

use anyhow::{Context, Result};

use traced_invocations_cli::output::OutputFormat;
use traced_invocations_lib::DeploymentPlan;

pub fn handle_plan(plan: &DeploymentPlan, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    format
        .render_plan(&mut stdout.lock(), plan)
        .context("failed to write plan")
}
