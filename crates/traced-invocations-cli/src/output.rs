//! Output formatting for plans and resolved outputs.
//!
//! Everything here writes to a caller-supplied writer; the subcommands pass
//! stdout, tests pass a `Vec<u8>`.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use traced_invocations_lib::{DeploymentPlan, Value};

/// Environment variable whose value is masked in text output.
const SECRET_VARIABLE: &str = "DD_API_KEY";

/// How a command renders its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Pretty-printed JSON for scripting.
    Json,
}

impl OutputFormat {
    pub fn render_plan<W: Write>(self, out: &mut W, plan: &DeploymentPlan) -> io::Result<()> {
        match self {
            OutputFormat::Text => render_plan_text(out, plan),
            OutputFormat::Json => render_json(out, plan),
        }
    }

    pub fn render_outputs<W: Write>(
        self,
        out: &mut W,
        outputs: &[ResolvedOutput],
    ) -> io::Result<()> {
        match self {
            OutputFormat::Text => {
                for output in outputs {
                    writeln!(out, "{} = {}", output.label, output.value)?;
                }
                Ok(())
            }
            OutputFormat::Json => render_json(out, outputs),
        }
    }
}

/// A named output after its forward references were bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOutput {
    pub label: String,
    pub description: String,
    pub value: String,
}

fn render_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Human-friendly plan view.
pub fn render_plan_text<W: Write>(out: &mut W, plan: &DeploymentPlan) -> io::Result<()> {
    writeln!(
        out,
        "Stack {} (account: {}, region: {})",
        plan.stack_name,
        plan.target.account.as_deref().unwrap_or("<provider default>"),
        plan.target.region.as_deref().unwrap_or("<provider default>"),
    )?;

    writeln!(out, "\nCompute units:")?;
    for unit in &plan.units {
        writeln!(
            out,
            "- {} ({}): {}, {} MB, {}s, handler {}",
            unit.logical_id,
            unit.name,
            unit.runtime,
            unit.memory.as_mb(),
            unit.timeout.as_secs(),
            unit.handler
        )?;
        for (name, value) in &unit.environment {
            writeln!(out, "    {}={}", name, display_env_value(name, value))?;
        }
        for extension in &unit.extensions {
            writeln!(out, "    layer {}", extension)?;
        }
    }

    let api = &plan.routes.api;
    writeln!(
        out,
        "\nRoutes ({}, stage {}, base {}):",
        api.name, api.stage, plan.routes.base_address
    )?;
    for binding in &plan.routes.bindings {
        writeln!(out, "- {} {} -> {}", binding.method, binding.path, binding.unit)?;
    }

    writeln!(out, "\nOutputs:")?;
    for output in &plan.outputs {
        writeln!(
            out,
            "- {}: {} ({})",
            output.label, output.value, output.description
        )?;
    }

    if !plan.defaulted.is_empty() {
        writeln!(out, "\nDefaulted:")?;
        for setting in &plan.defaulted {
            writeln!(out, "- {}", setting)?;
        }
    }
    Ok(())
}

fn display_env_value(name: &str, value: &Value) -> String {
    match value.as_literal() {
        Some(secret) if name == SECRET_VARIABLE => mask(secret),
        _ => value.to_string(),
    }
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
