//! Artifact building seam.
//!
//! Turning a unit's [`BuildInstructions`](crate::plan::BuildInstructions)
//! into an executable is the job of an external toolchain. This module only
//! defines the narrow [`ArtifactBuilder`] interface plus two implementations:
//!
//! - [`StagedArtifacts`]: points every unit at a pre-staged asset directory
//!   without building anything (used for synthesis).
//! - [`ContainerBundler`]: runs the unit's toolchain image under podman or
//!   docker and collects `/asset-output/bootstrap`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::plan::{ComputeUnitSpec, DeploymentPlan};

/// File name the function runtime expects inside the artifact.
pub const BOOTSTRAP_FILE: &str = "bootstrap";

/// Where a built artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    /// Logical id of the unit this artifact belongs to.
    pub unit: String,
    /// Directory (or asset key) holding the executable.
    pub location: PathBuf,
}

impl ArtifactHandle {
    /// Object key the artifact is uploaded under.
    ///
    /// The staging step zips each artifact directory and stores it as
    /// `<directory name>/bootstrap.zip` in the asset bucket. A location with
    /// no final component falls back to the unit's logical id.
    pub fn asset_key(&self) -> String {
        let dir = self
            .location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.unit.clone());
        format!("{dir}/{BOOTSTRAP_FILE}.zip")
    }
}

/// Produces an artifact for a compute unit.
pub trait ArtifactBuilder {
    fn build(&self, unit: &ComputeUnitSpec) -> Result<ArtifactHandle>;
}

/// Artifacts for every unit of a plan, keyed by logical id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    artifacts: BTreeMap<String, ArtifactHandle>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every unit in plan order, stopping at the first failure.
    pub fn build_all<B: ArtifactBuilder + ?Sized>(
        builder: &B,
        plan: &DeploymentPlan,
    ) -> Result<Self> {
        let mut set = Self::new();
        for unit in &plan.units {
            set.insert(builder.build(unit)?);
        }
        Ok(set)
    }

    pub fn insert(&mut self, handle: ArtifactHandle) {
        self.artifacts.insert(handle.unit.clone(), handle);
    }

    pub fn get(&self, unit: &str) -> Option<&ArtifactHandle> {
        self.artifacts.get(unit)
    }

    /// Like [`get`](Self::get) but reports a missing artifact as an error.
    pub fn require(&self, unit: &str) -> Result<&ArtifactHandle> {
        self.get(unit).ok_or_else(|| Error::MissingArtifact {
            unit: unit.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Builder that assumes artifacts were staged under `<root>/<unit name>`.
#[derive(Debug, Clone)]
pub struct StagedArtifacts {
    root: PathBuf,
}

impl StagedArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactBuilder for StagedArtifacts {
    fn build(&self, unit: &ComputeUnitSpec) -> Result<ArtifactHandle> {
        Ok(ArtifactHandle {
            unit: unit.logical_id.clone(),
            location: self.root.join(&unit.name),
        })
    }
}

/// Container runtimes able to run a toolchain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    Podman,
    Docker,
}

impl ContainerRuntime {
    pub fn command(&self) -> &'static str {
        match self {
            ContainerRuntime::Podman => "podman",
            ContainerRuntime::Docker => "docker",
        }
    }

    /// Prefer podman, fall back to docker.
    pub fn detect() -> Result<Self> {
        [ContainerRuntime::Podman, ContainerRuntime::Docker]
            .into_iter()
            .find(|rt| rt.is_installed())
            .ok_or(Error::NoContainerRuntime)
    }

    fn is_installed(&self) -> bool {
        Command::new(self.command())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Runs each unit's toolchain image with the source tree mounted read-only.
#[derive(Debug, Clone)]
pub struct ContainerBundler {
    program: String,
    source_dir: PathBuf,
    output_root: PathBuf,
}

impl ContainerBundler {
    pub fn new(
        runtime: ContainerRuntime,
        source_dir: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: runtime.command().to_string(),
            source_dir: source_dir.into(),
            output_root: output_root.into(),
        }
    }

    /// Use an arbitrary executable in place of podman/docker.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the container runtime for `unit`.
    pub fn run_args(&self, unit: &ComputeUnitSpec, output_dir: &Path) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        if let Some(user) = &unit.build.user {
            args.push("-u".to_string());
            args.push(user.clone());
        }
        args.push("-v".to_string());
        args.push(format!("{}:/asset-input:ro", self.source_dir.display()));
        args.push("-v".to_string());
        args.push(format!("{}:/asset-output", output_dir.display()));
        args.push("-w".to_string());
        args.push("/asset-input".to_string());
        args.push(unit.build.image.clone());
        args.extend(unit.build.command.iter().cloned());
        args
    }
}

impl ArtifactBuilder for ContainerBundler {
    fn build(&self, unit: &ComputeUnitSpec) -> Result<ArtifactHandle> {
        let output_dir = self.output_root.join(&unit.name);
        fs::create_dir_all(&output_dir)?;
        let bootstrap = output_dir.join(BOOTSTRAP_FILE);
        // A previous run's executable must not pass for this run's output.
        match fs::remove_file(&bootstrap) {
            Ok(()) => debug!(unit = %unit.logical_id, "removed stale bootstrap"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let args = self.run_args(unit, &output_dir);
        info!(
            unit = %unit.logical_id,
            image = %unit.build.image,
            program = %self.program,
            "bundling compute unit"
        );
        debug!(args = ?args, "toolchain invocation");

        let output = Command::new(&self.program).args(&args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(unit = %unit.logical_id, status = %output.status, "toolchain failed");
            return Err(Error::ToolchainFailure {
                unit: unit.logical_id.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        if !bootstrap.is_file() {
            return Err(Error::ArtifactMissingOutput {
                unit: unit.logical_id.clone(),
                path: bootstrap,
            });
        }

        info!(unit = %unit.logical_id, artifact = %output_dir.display(), "artifact ready");
        Ok(ArtifactHandle {
            unit: unit.logical_id.clone(),
            location: output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvironmentInputs;
    use crate::resolver::{resolve, HELLO_WORLD_LOGICAL_ID, INVOKER_LOGICAL_ID};

    #[test]
    fn staged_artifacts_cover_every_unit() {
        let plan = resolve(&EnvironmentInputs::default()).unwrap();
        let set = ArtifactSet::build_all(&StagedArtifacts::new("cdk.out"), &plan).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.require(HELLO_WORLD_LOGICAL_ID).unwrap().location,
            PathBuf::from("cdk.out/hello-world")
        );
        assert_eq!(
            set.require(INVOKER_LOGICAL_ID).unwrap().location,
            PathBuf::from("cdk.out/invoker")
        );
    }

    #[test]
    fn asset_key_follows_artifact_directory() {
        let handle = ArtifactHandle {
            unit: "Fn".to_string(),
            location: PathBuf::from("build/out/custom-dir"),
        };
        assert_eq!(handle.asset_key(), "custom-dir/bootstrap.zip");

        let bare = ArtifactHandle {
            unit: "Fn".to_string(),
            location: PathBuf::from("/"),
        };
        assert_eq!(bare.asset_key(), "Fn/bootstrap.zip");
    }

    #[test]
    fn require_reports_missing_unit() {
        let err = ArtifactSet::new().require("Nope").unwrap_err();
        assert_eq!(err.to_string(), "no artifact available for compute unit Nope");
    }

    #[test]
    fn run_args_mount_input_and_output() {
        let plan = resolve(&EnvironmentInputs::default()).unwrap();
        let unit = &plan.units[0];
        let bundler = ContainerBundler::new(ContainerRuntime::Docker, "/src", "/out");
        let args = bundler.run_args(unit, Path::new("/out/hello-world"));

        assert_eq!(&args[..4], ["run", "--rm", "-u", "root"]);
        assert!(args.contains(&"/src:/asset-input:ro".to_string()));
        assert!(args.contains(&"/out/hello-world:/asset-output".to_string()));
        let image_pos = args.iter().position(|a| *a == unit.build.image).unwrap();
        assert_eq!(&args[image_pos + 1..], unit.build.command.as_slice());
    }

    #[cfg(unix)]
    #[test]
    fn failing_toolchain_surfaces_stderr() {
        let plan = resolve(&EnvironmentInputs::default()).unwrap();
        let out = tempfile::tempdir().unwrap();
        let bundler = ContainerBundler::new(ContainerRuntime::Docker, "/src", out.path())
            .with_program("false");

        let err = bundler.build(&plan.units[0]).unwrap_err();
        assert!(matches!(
            err,
            Error::ToolchainFailure { ref unit, .. } if unit == HELLO_WORLD_LOGICAL_ID
        ));
    }

    #[cfg(unix)]
    #[test]
    fn successful_toolchain_without_bootstrap_is_an_error() {
        let plan = resolve(&EnvironmentInputs::default()).unwrap();
        let out = tempfile::tempdir().unwrap();
        let bundler = ContainerBundler::new(ContainerRuntime::Docker, "/src", out.path())
            .with_program("true");

        let err = bundler.build(&plan.units[0]).unwrap_err();
        assert!(matches!(err, Error::ArtifactMissingOutput { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn stale_bootstrap_from_previous_run_is_not_reused() {
        let plan = resolve(&EnvironmentInputs::default()).unwrap();
        let out = tempfile::tempdir().unwrap();
        let unit_dir = out.path().join(&plan.units[0].name);
        fs::create_dir_all(&unit_dir).unwrap();
        fs::write(unit_dir.join(BOOTSTRAP_FILE), b"old build").unwrap();

        let bundler = ContainerBundler::new(ContainerRuntime::Docker, "/src", out.path())
            .with_program("true");

        let err = bundler.build(&plan.units[0]).unwrap_err();
        assert!(matches!(err, Error::ArtifactMissingOutput { .. }));
        assert!(!unit_dir.join(BOOTSTRAP_FILE).exists());
    }
}
