//! `bundle` subcommand: build every unit's artifact in a toolchain container.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use traced_invocations_lib::{ArtifactSet, ContainerBundler, ContainerRuntime, DeploymentPlan};

/// Container runtime selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuntimeArg {
    Docker,
    Podman,
}

impl From<RuntimeArg> for ContainerRuntime {
    fn from(value: RuntimeArg) -> Self {
        match value {
            RuntimeArg::Docker => ContainerRuntime::Docker,
            RuntimeArg::Podman => ContainerRuntime::Podman,
        }
    }
}

/// Options for [`handle_bundle`].
#[derive(Debug, Clone)]
pub struct BundleOptions<'a> {
    pub source: &'a Path,
    pub out: &'a Path,
    pub runtime: Option<RuntimeArg>,
    /// Executable to run instead of the runtime's own binary.
    pub program: Option<&'a str>,
}

pub fn handle_bundle(plan: &DeploymentPlan, options: BundleOptions<'_>) -> Result<()> {
    let source = options
        .source
        .canonicalize()
        .with_context(|| format!("source directory {} not found", options.source.display()))?;
    fs::create_dir_all(options.out)
        .with_context(|| format!("failed to create {}", options.out.display()))?;
    let out = options.out.canonicalize()?;

    // An explicit program skips runtime detection; docker argument syntax is assumed.
    let runtime = match (options.runtime, options.program) {
        (Some(runtime), _) => runtime.into(),
        (None, Some(_)) => ContainerRuntime::Docker,
        (None, None) => {
            ContainerRuntime::detect().context("cannot bundle without a container runtime")?
        }
    };
    let mut bundler = ContainerBundler::new(runtime, source, out);
    if let Some(program) = options.program {
        bundler = bundler.with_program(program);
    }

    let artifacts =
        ArtifactSet::build_all(&bundler, plan).context("failed to bundle compute units")?;

    for unit in &plan.units {
        if let Some(handle) = artifacts.get(&unit.logical_id) {
            println!("{} -> {}", unit.logical_id, handle.location.display());
        }
    }
    Ok(())
}
