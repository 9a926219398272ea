//! Deployment descriptor resolution.
//!
//! [`resolve`] turns [`EnvironmentInputs`] into a [`DeploymentPlan`]: a REST
//! API bound to the hello-world unit, plus an invoker unit that calls back
//! into that API once it exists. Resolution is pure data assembly; it never
//! touches the network or the filesystem.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::env::{DefaultedSetting, EnvironmentInputs, StackTarget};
use crate::error::Result;
use crate::plan::{
    BuildInstructions, ComputeUnitSpec, DeploymentPlan, ExtensionRef, HttpMethod, MemorySize,
    NamedOutput, RestApiSpec, RoutePlan, Timeout,
};
use crate::profile::StackProfile;
use crate::value::Value;

pub const HELLO_WORLD_LOGICAL_ID: &str = "HelloWorldFunction";
pub const INVOKER_LOGICAL_ID: &str = "InvokerFunction";
pub const REST_API_LOGICAL_ID: &str = "tracedInvocationsAPI";

pub const HELLO_WORLD_PACKAGE: &str = "traced-invocations-lambda-hello-world";
pub const INVOKER_PACKAGE: &str = "traced-invocations-lambda-invoker";

pub const API_URL_OUTPUT: &str = "ApiUrl";
pub const INVOKER_URL_OUTPUT: &str = "InvokerUrl";

/// Environment variable through which the invoker learns the API address.
pub const TARGET_API_URL_VAR: &str = "TARGET_API_URL";

/// Resolve a plan using the default [`StackProfile`].
pub fn resolve(env: &EnvironmentInputs) -> Result<DeploymentPlan> {
    resolve_with(&StackProfile::default(), env)
}

/// Resolve a plan with an explicit profile.
///
/// Only an invalid memory size or timeout in `profile` can make this fail;
/// account and region are passed through unvalidated.
pub fn resolve_with(profile: &StackProfile, env: &EnvironmentInputs) -> Result<DeploymentPlan> {
    // Inputs built as struct literals or deserialized skip `new`'s blank check.
    let env = &EnvironmentInputs::new(
        env.account.clone(),
        env.region.clone(),
        env.api_key.clone(),
    );
    let mut defaulted = Vec::new();

    let target = StackTarget {
        account: env.account.clone(),
        region: env.region.clone(),
    };
    if target.account.is_none() {
        debug!("no account supplied; deferring to provisioning engine");
        defaulted.push(DefaultedSetting::Account);
    }
    if target.region.is_none() {
        debug!("no region supplied; deferring to provisioning engine");
        defaulted.push(DefaultedSetting::Region);
    }

    let api_key = match env.api_key.as_deref() {
        Some(key) => key.to_string(),
        None => {
            warn!("DD_API_KEY not set; tracing will use a placeholder key and will not ship data");
            defaulted.push(DefaultedSetting::ApiKey);
            profile.placeholder_api_key.clone()
        }
    };

    let memory = MemorySize::from_mb(profile.memory_mb)?;
    let timeout = Timeout::from_secs(profile.timeout_secs)?;
    let extension = ExtensionRef::new(profile.extension_arn.clone());

    let mut hello_world = compute_unit(
        profile,
        HELLO_WORLD_LOGICAL_ID,
        "hello-world",
        HELLO_WORLD_PACKAGE,
        memory,
        timeout,
    );
    set_tracing_env(&mut hello_world, profile, &api_key, &profile.service_name)?;

    // The route plan must exist before any unit that embeds its address.
    let mut routes = RoutePlan::new(RestApiSpec {
        logical_id: REST_API_LOGICAL_ID.to_string(),
        name: profile.api_name.clone(),
        description: profile.api_description.clone(),
        stage: profile.api_stage.clone(),
    });
    routes.bind_root(&hello_world, HttpMethod::Get);

    let mut invoker = compute_unit(
        profile,
        INVOKER_LOGICAL_ID,
        "invoker",
        INVOKER_PACKAGE,
        memory,
        timeout,
    );
    set_tracing_env(
        &mut invoker,
        profile,
        &api_key,
        &profile.invoker_service_name,
    )?;
    invoker.set_env(TARGET_API_URL_VAR, routes.base_address_value())?;

    hello_world.attach_extension(&extension);
    invoker.attach_extension(&extension);

    // Only the root route exists; the invoke path is concatenated regardless.
    let outputs = vec![
        NamedOutput {
            label: API_URL_OUTPUT.to_string(),
            description: "URL of the API Gateway".to_string(),
            value: routes.base_address_value(),
        },
        NamedOutput {
            label: INVOKER_URL_OUTPUT.to_string(),
            description: "URL to invoke the invoker lambda".to_string(),
            value: Value::with_suffix(routes.base_address_value(), profile.invoke_suffix.clone()),
        },
    ];

    info!(
        stack = %profile.stack_name,
        units = 2,
        routes = routes.bindings.len(),
        defaulted = defaulted.len(),
        "deployment plan resolved"
    );

    Ok(DeploymentPlan {
        stack_name: profile.stack_name.clone(),
        target,
        units: vec![hello_world, invoker],
        routes,
        outputs,
        defaulted,
    })
}

fn compute_unit(
    profile: &StackProfile,
    logical_id: &str,
    name: &str,
    package: &str,
    memory: MemorySize,
    timeout: Timeout,
) -> ComputeUnitSpec {
    ComputeUnitSpec {
        logical_id: logical_id.to_string(),
        name: name.to_string(),
        handler: profile.handler.clone(),
        runtime: profile.runtime.clone(),
        build: BuildInstructions {
            image: profile.toolchain_image.clone(),
            command: profile.build_command(package),
            user: profile.build_user.clone(),
        },
        memory,
        timeout,
        environment: BTreeMap::new(),
        extensions: Vec::new(),
    }
}

fn set_tracing_env(
    unit: &mut ComputeUnitSpec,
    profile: &StackProfile,
    api_key: &str,
    service: &str,
) -> Result<()> {
    unit.set_env("DD_API_KEY", api_key)?;
    unit.set_env("DD_SERVICE", service)?;
    unit.set_env("DD_SITE", profile.tracing_site.as_str())?;
    unit.set_env("DD_TRACE_ENABLED", "true")?;
    unit.set_env("DD_TRACE_MANAGED_SERVICES", "true")?;
    unit.set_env("DD_COLD_START_TRACING", "false")?;
    unit.set_env("DD_ENV", profile.tracing_env.as_str())?;
    Ok(())
}
