//! Assembling resolver inputs from flags, the environment and profile files.

use std::path::Path;

use anyhow::{Context, Result};

use traced_invocations_lib::{EnvironmentInputs, StackProfile};

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub account: Option<String>,
    pub region: Option<String>,
    pub api_key: Option<String>,
}

/// Combine explicit flags with the ambient environment; flags win.
pub fn environment_inputs(flags: InputFlags, ambient: EnvironmentInputs) -> EnvironmentInputs {
    ambient.overlay(EnvironmentInputs::new(
        flags.account,
        flags.region,
        flags.api_key,
    ))
}

/// Load the stack profile at `path`, or the built-in one when absent.
pub fn load_profile(path: Option<&Path>) -> Result<StackProfile> {
    match path {
        Some(path) => StackProfile::from_path(path)
            .with_context(|| format!("failed to load stack profile {}", path.display())),
        None => Ok(StackProfile::default()),
    }
}
