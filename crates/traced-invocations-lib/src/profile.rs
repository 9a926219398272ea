//! Fixed values applied by the resolver.
//!
//! [`StackProfile::default`] describes the traced invocations stack as it is
//! deployed today. A JSON file with the same shape can override any subset of
//! fields for other environments.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder used when no tracing API key is supplied.
pub const PLACEHOLDER_API_KEY: &str = "your_datadog_api_key_here";

/// Tracing extension layer attached to every compute unit.
pub const DATADOG_EXTENSION_ARN: &str =
    "arn:aws:lambda:us-west-2:464622532012:layer:Datadog-Extension:83";

/// Literal appended to the API base address for the invoker output.
pub const INVOKE_PATH_SUFFIX: &str = "invoke";

/// Values the resolver bakes into the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackProfile {
    pub stack_name: String,
    pub service_name: String,
    pub invoker_service_name: String,
    pub tracing_site: String,
    pub tracing_env: String,
    pub extension_arn: String,
    pub memory_mb: u32,
    pub timeout_secs: u32,
    pub runtime: String,
    pub handler: String,
    pub toolchain_image: String,
    pub build_user: Option<String>,
    pub api_name: String,
    pub api_description: String,
    pub api_stage: String,
    pub invoke_suffix: String,
    pub placeholder_api_key: String,
}

impl Default for StackProfile {
    fn default() -> Self {
        Self {
            stack_name: "TracedInvocationsStack".to_string(),
            service_name: "traced-invocations".to_string(),
            invoker_service_name: "traced-invocations-invoker".to_string(),
            tracing_site: "datadoghq.com".to_string(),
            tracing_env: "joe".to_string(),
            extension_arn: DATADOG_EXTENSION_ARN.to_string(),
            memory_mb: 128,
            timeout_secs: 30,
            runtime: "provided.al2023".to_string(),
            handler: "bootstrap".to_string(),
            toolchain_image: "rust:1.86-bookworm".to_string(),
            build_user: Some("root".to_string()),
            api_name: "Traced Invocations Service".to_string(),
            api_description: "This service serves traced invocations.".to_string(),
            api_stage: "prod".to_string(),
            invoke_suffix: INVOKE_PATH_SUFFIX.to_string(),
            placeholder_api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}

impl StackProfile {
    /// Load a profile from a JSON file; missing fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::ProfileLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| Error::ProfileLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Toolchain command that compiles `package` and stages it as `bootstrap`.
    pub fn build_command(&self, package: &str) -> Vec<String> {
        let target = "x86_64-unknown-linux-musl";
        vec![
            "bash".to_string(),
            "-c".to_string(),
            format!(
                "apt-get update -qq && apt-get install -y -qq musl-tools \
                 && rustup target add {target} \
                 && cd /asset-input \
                 && CARGO_TARGET_DIR=/tmp/target cargo build --release --locked --target {target} -p {package} \
                 && cp /tmp/target/{target}/release/{package} /asset-output/bootstrap"
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_profile_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tracing_env": "staging", "memory_mb": 256}}"#).unwrap();

        let profile = StackProfile::from_path(file.path()).unwrap();
        assert_eq!(profile.tracing_env, "staging");
        assert_eq!(profile.memory_mb, 256);
        assert_eq!(profile.service_name, "traced-invocations");
        assert_eq!(profile.extension_arn, DATADOG_EXTENSION_ARN);
    }

    #[test]
    fn unreadable_profile_reports_path() {
        let err = StackProfile::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn build_command_stages_bootstrap() {
        let command = StackProfile::default().build_command("my-fn");
        assert_eq!(command[0], "bash");
        assert!(command[2].contains("-p my-fn"));
        assert!(command[2].ends_with("/asset-output/bootstrap"));
    }
}
