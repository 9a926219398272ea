//! `synth` subcommand: render the provisioning template.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use traced_invocations_lib::{synthesize, ArtifactSet, DeploymentPlan, StagedArtifacts};

/// Synthesize the template, assuming artifacts are staged under `asset_root`.
///
/// Writes to `output` when given, stdout otherwise.
pub fn handle_synth(plan: &DeploymentPlan, asset_root: &Path, output: Option<&Path>) -> Result<()> {
    let artifacts = ArtifactSet::build_all(&StagedArtifacts::new(asset_root), plan)
        .context("failed to locate staged artifacts")?;
    let template = synthesize(plan, &artifacts).context("failed to synthesize template")?;
    let json = template
        .to_json_pretty()
        .context("failed to serialize template")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write template to {}", path.display()))?;
            info!(
                path = %path.display(),
                resources = template.resources.len(),
                "template written"
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
