//! `outputs` subcommand: render named outputs against a deployed API address.

use std::io;

use anyhow::{Context, Result};

use traced_invocations_cli::output::{OutputFormat, ResolvedOutput};
use traced_invocations_lib::DeploymentPlan;

/// Bind the plan's base address to `api_url` and print every named output.
pub fn handle_outputs(plan: &DeploymentPlan, api_url: &str, format: OutputFormat) -> Result<()> {
    let outputs = resolve_outputs(plan, api_url)?;
    let stdout = io::stdout();
    format
        .render_outputs(&mut stdout.lock(), &outputs)
        .context("failed to write outputs")
}

pub fn resolve_outputs(plan: &DeploymentPlan, api_url: &str) -> Result<Vec<ResolvedOutput>> {
    let bindings = plan.bindings_for_base_address(api_url);
    let values = plan
        .resolve_outputs(&bindings)
        .context("failed to render stack outputs")?;

    Ok(plan
        .outputs
        .iter()
        .zip(values)
        .map(|(output, (label, value))| ResolvedOutput {
            label,
            description: output.description.clone(),
            value,
        })
        .collect())
}
