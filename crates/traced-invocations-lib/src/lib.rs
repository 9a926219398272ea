//! Traced invocations library entry points.
//!
//! This crate resolves the deployment plan for the traced invocations stack
//! (a REST API in front of a hello-world function, plus an invoker function
//! that calls back into the API), renders that plan into a provisioning
//! template, and defines the seam to the external artifact builder.
//! Higher-level consumers (the CLI) should only depend on the functions
//! exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod build;
pub mod env;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod profile;
pub mod resolver;
pub mod value;

pub use build::{
    ArtifactBuilder, ArtifactHandle, ArtifactSet, ContainerBundler, ContainerRuntime,
    StagedArtifacts,
};
pub use env::{DefaultedSetting, EnvironmentInputs, StackTarget};
pub use error::{Error, Result};
pub use manifest::{synthesize, Template};
pub use plan::{
    BuildInstructions, ComputeUnitSpec, DeploymentPlan, ExtensionRef, HttpMethod, MemorySize,
    NamedOutput, RestApiSpec, RouteBinding, RoutePlan, Timeout,
};
pub use profile::{StackProfile, DATADOG_EXTENSION_ARN, INVOKE_PATH_SUFFIX, PLACEHOLDER_API_KEY};
pub use resolver::{resolve, resolve_with};
pub use value::{Bindings, ForwardRef, Value};
