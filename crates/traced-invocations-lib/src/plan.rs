//! The deployment plan data model.
//!
//! A [`DeploymentPlan`] is assembled once per resolver run and handed,
//! unchanged, to whatever consumes it (the manifest synthesizer, the CLI, or
//! an external provisioning engine).

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env::{DefaultedSetting, StackTarget};
use crate::error::{Error, Result};
use crate::value::{Bindings, ForwardRef, Value};

/// Memory limit for a compute unit, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MemorySize(u32);

impl MemorySize {
    /// Smallest memory size the function runtime accepts.
    pub const MIN_MB: u32 = 128;
    /// Largest memory size the function runtime accepts.
    pub const MAX_MB: u32 = 10_240;

    pub fn from_mb(mb: u32) -> Result<Self> {
        if (Self::MIN_MB..=Self::MAX_MB).contains(&mb) {
            Ok(Self(mb))
        } else {
            Err(Error::InvalidMemorySize {
                mb,
                min: Self::MIN_MB,
                max: Self::MAX_MB,
            })
        }
    }

    pub fn as_mb(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for MemorySize {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_mb(value)
    }
}

impl From<MemorySize> for u32 {
    fn from(value: MemorySize) -> Self {
        value.0
    }
}

/// Invocation timeout for a compute unit, bounded by the provider maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Timeout(u32);

impl Timeout {
    /// Provider maximum (15 minutes).
    pub const MAX_SECS: u32 = 900;

    pub fn from_secs(secs: u32) -> Result<Self> {
        if secs == 0 || secs > Self::MAX_SECS {
            return Err(Error::InvalidTimeout {
                secs,
                max: Self::MAX_SECS,
            });
        }
        Ok(Self(secs))
    }

    pub fn as_secs(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl TryFrom<u32> for Timeout {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_secs(value)
    }
}

impl From<Timeout> for u32 {
    fn from(value: Timeout) -> Self {
        value.0
    }
}

/// Opaque instructions for the external artifact builder.
///
/// The resolver never interprets these; they are passed straight through to
/// an [`ArtifactBuilder`](crate::build::ArtifactBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInstructions {
    /// Toolchain container image reference.
    pub image: String,
    /// Command run inside the toolchain container.
    pub command: Vec<String>,
    /// User the command runs as, if not the image default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Versioned, externally published runtime add-on (a function layer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionRef(String);

impl ExtensionRef {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn arn(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One deployable serverless function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUnitSpec {
    /// Identifier of the unit inside the plan and the synthesized template.
    pub logical_id: String,
    /// Short human name, also used as the asset directory name.
    pub name: String,
    /// Entry-point reference inside the artifact.
    pub handler: String,
    /// Opaque runtime class.
    pub runtime: String,
    pub build: BuildInstructions,
    pub memory: MemorySize,
    pub timeout: Timeout,
    pub environment: BTreeMap<String, Value>,
    pub extensions: Vec<ExtensionRef>,
}

impl ComputeUnitSpec {
    /// Declare an environment variable; each name may only be declared once.
    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();
        if self.environment.contains_key(&name) {
            return Err(Error::DuplicateEnvironmentVariable {
                unit: self.logical_id.clone(),
                name,
            });
        }
        self.environment.insert(name, value.into());
        Ok(())
    }

    /// Attach an extension; the extension itself is only referenced, never changed.
    pub fn attach_extension(&mut self, extension: &ExtensionRef) {
        if !self.extensions.contains(extension) {
            self.extensions.push(extension.clone());
        }
    }

    pub fn env(&self, name: &str) -> Option<&Value> {
        self.environment.get(name)
    }

    /// Literal value of an environment variable, if it is not deferred.
    pub fn env_literal(&self, name: &str) -> Option<&str> {
        self.env(name).and_then(Value::as_literal)
    }

    /// True if any environment value waits on the given forward reference.
    pub fn depends_on(&self, reference: &ForwardRef) -> bool {
        self.environment
            .values()
            .any(|v| v.references().contains(&reference))
    }
}

/// HTTP method bound on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Any,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Any => "ANY",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The REST API that fronts the compute units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiSpec {
    pub logical_id: String,
    pub name: String,
    pub description: String,
    /// Deployment stage; part of the materialized base address.
    pub stage: String,
}

/// A compute unit bound to an HTTP entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBinding {
    /// Logical id of the bound compute unit.
    pub unit: String,
    pub method: HttpMethod,
    pub path: String,
    pub is_root: bool,
}

/// Public entry points and the units behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub api: RestApiSpec,
    /// Only known once the API is materialized.
    pub base_address: ForwardRef,
    pub bindings: Vec<RouteBinding>,
}

impl RoutePlan {
    pub fn new(api: RestApiSpec) -> Self {
        let base_address = ForwardRef::url_of(api.logical_id.clone());
        Self {
            api,
            base_address,
            bindings: Vec::new(),
        }
    }

    /// Bind a unit on the root of the route tree.
    pub fn bind_root(&mut self, unit: &ComputeUnitSpec, method: HttpMethod) {
        self.bindings.push(RouteBinding {
            unit: unit.logical_id.clone(),
            method,
            path: "/".to_string(),
            is_root: true,
        });
    }

    /// The base address as a deferred value.
    pub fn base_address_value(&self) -> Value {
        Value::Reference(self.base_address.clone())
    }
}

/// A value surfaced to the operator after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedOutput {
    pub label: String,
    pub description: String,
    pub value: Value,
}

/// The complete, immutable result of a resolver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub stack_name: String,
    pub target: StackTarget,
    pub units: Vec<ComputeUnitSpec>,
    pub routes: RoutePlan,
    pub outputs: Vec<NamedOutput>,
    /// Inputs that were absent and fell back to defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<DefaultedSetting>,
}

impl DeploymentPlan {
    pub fn unit(&self, logical_id: &str) -> Option<&ComputeUnitSpec> {
        self.units.iter().find(|u| u.logical_id == logical_id)
    }

    pub fn output(&self, label: &str) -> Option<&NamedOutput> {
        self.outputs.iter().find(|o| o.label == label)
    }

    pub fn was_defaulted(&self, setting: DefaultedSetting) -> bool {
        self.defaulted.contains(&setting)
    }

    /// Render every named output against materialized bindings, in order.
    pub fn resolve_outputs(&self, bindings: &Bindings) -> Result<Vec<(String, String)>> {
        self.outputs
            .iter()
            .map(|o| Ok((o.label.clone(), o.value.render(bindings)?)))
            .collect()
    }

    /// Bindings for a plan whose only forward reference is the API base address.
    pub fn bindings_for_base_address(&self, base_address: impl Into<String>) -> Bindings {
        Bindings::new().bind(self.routes.base_address.clone(), base_address)
    }
}
