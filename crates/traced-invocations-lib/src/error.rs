use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the traced invocations library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Memory limit outside the range the function runtime accepts.
    #[error("memory size {mb} MB is outside the supported range {min}..={max} MB")]
    InvalidMemorySize { mb: u32, min: u32, max: u32 },

    /// Timeout of zero seconds or above the provider maximum.
    #[error("timeout of {secs}s is invalid; expected 1..={max}s")]
    InvalidTimeout { secs: u32, max: u32 },

    /// Raised when a compute unit declares the same environment variable twice.
    #[error("environment variable {name} declared twice on {unit}")]
    DuplicateEnvironmentVariable { unit: String, name: String },

    /// A forward reference was rendered before the provisioning engine bound it.
    #[error("no binding for {resource}.{attribute}")]
    UnboundReference { resource: String, attribute: String },

    /// Raised when synthesizing a template for a unit that was never built.
    #[error("no artifact available for compute unit {unit}")]
    MissingArtifact { unit: String },

    /// Neither podman nor docker could be found on PATH.
    #[error("no container runtime available; install docker or podman to bundle artifacts")]
    NoContainerRuntime,

    /// The external toolchain exited unsuccessfully.
    #[error("toolchain failed while building {unit} ({status}): {stderr}")]
    ToolchainFailure {
        unit: String,
        status: String,
        stderr: String,
    },

    /// The toolchain exited cleanly but left no executable behind.
    #[error("toolchain for {unit} did not produce {path}")]
    ArtifactMissingOutput { unit: String, path: PathBuf },

    /// Raised when a stack profile file cannot be read or parsed.
    #[error("failed to load stack profile from {path}: {message}")]
    ProfileLoad { path: PathBuf, message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
