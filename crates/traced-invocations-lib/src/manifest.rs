//! Manifest synthesis.
//!
//! Renders a [`DeploymentPlan`] into a CloudFormation-shaped template that a
//! provisioning engine can consume. Forward references stay deferred: they
//! become `Ref` / `Fn::GetAtt` / `Fn::Join` intrinsics, never literal strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tracing::debug;

use crate::build::{ArtifactHandle, ArtifactSet};
use crate::error::Result;
use crate::plan::{ComputeUnitSpec, DeploymentPlan, RouteBinding};
use crate::value::{ForwardRef, Value, ATTR_URL};

const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
const ASSET_BUCKET_PARAMETER: &str = "AssetBucket";
const BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// A single template resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Json,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

impl Resource {
    fn new(resource_type: &str, properties: Json) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
            metadata: None,
        }
    }
}

/// A stack output in template form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    pub description: String,
    pub value: Json,
}

/// The synthesized provisioning manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    pub description: String,
    pub metadata: Json,
    pub parameters: BTreeMap<String, Json>,
    pub resources: BTreeMap<String, Resource>,
    pub outputs: BTreeMap<String, TemplateOutput>,
}

impl Template {
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Logical ids of all resources of the given type, sorted.
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Synthesize the template for `plan`, using `artifacts` for function code.
///
/// Fails with [`Error::MissingArtifact`](crate::Error::MissingArtifact) if a
/// unit has no artifact.
pub fn synthesize(plan: &DeploymentPlan, artifacts: &ArtifactSet) -> Result<Template> {
    let ctx = RenderContext { plan };
    let mut resources = BTreeMap::new();

    for unit in &plan.units {
        let artifact = artifacts.require(&unit.logical_id)?;
        let role_id = role_id(unit);
        resources.insert(role_id.clone(), execution_role());

        let mut function = Resource::new(
            "AWS::Lambda::Function",
            ctx.function_properties(unit, artifact, &role_id),
        );
        function.depends_on.push(role_id);
        function.metadata = Some(json!({
            "aws:asset:path": artifact.location.display().to_string(),
            "aws:asset:property": "Code",
        }));
        resources.insert(unit.logical_id.clone(), function);
    }

    let api = &plan.routes.api;
    resources.insert(
        api.logical_id.clone(),
        Resource::new(
            "AWS::ApiGateway::RestApi",
            json!({ "Name": api.name, "Description": api.description }),
        ),
    );

    let mut method_ids = Vec::new();
    for binding in &plan.routes.bindings {
        for (id, resource) in ctx.path_resources(binding) {
            resources.entry(id).or_insert(resource);
        }
        let method_id = method_id(&api.logical_id, binding);
        resources.insert(method_id.clone(), ctx.method(binding));
        resources.insert(
            format!("{}Permission{}", binding.unit, binding.method),
            ctx.permission(binding),
        );
        method_ids.push(method_id);
    }

    let deployment_id = format!("{}Deployment", api.logical_id);
    let mut deployment = Resource::new(
        "AWS::ApiGateway::Deployment",
        json!({ "RestApiId": reference(&api.logical_id) }),
    );
    deployment.depends_on = method_ids;
    resources.insert(deployment_id.clone(), deployment);
    resources.insert(
        stage_id(&api.logical_id, &api.stage),
        Resource::new(
            "AWS::ApiGateway::Stage",
            json!({
                "RestApiId": reference(&api.logical_id),
                "DeploymentId": reference(&deployment_id),
                "StageName": api.stage,
            }),
        ),
    );

    let outputs = plan
        .outputs
        .iter()
        .map(|o| {
            (
                o.label.clone(),
                TemplateOutput {
                    description: o.description.clone(),
                    value: ctx.render(&o.value),
                },
            )
        })
        .collect();

    let mut parameters = BTreeMap::new();
    parameters.insert(
        ASSET_BUCKET_PARAMETER.to_string(),
        json!({ "Type": "String", "Description": "Bucket holding the staged function artifacts" }),
    );

    debug!(resources = resources.len(), stack = %plan.stack_name, "template synthesized");

    Ok(Template {
        format_version: TEMPLATE_FORMAT_VERSION.to_string(),
        description: plan.stack_name.clone(),
        metadata: json!({
            "Environment": format!(
                "aws://{}/{}",
                plan.target.account.as_deref().unwrap_or("unknown-account"),
                plan.target.region.as_deref().unwrap_or("unknown-region"),
            ),
        }),
        parameters,
        resources,
        outputs,
    })
}

fn role_id(unit: &ComputeUnitSpec) -> String {
    format!("{}ServiceRole", unit.logical_id)
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn binds_root(binding: &RouteBinding) -> bool {
    binding.is_root || path_segments(&binding.path).is_empty()
}

/// Logical id of the `AWS::ApiGateway::Resource` for a path prefix.
fn path_resource_id(api_id: &str, segments: &[&str]) -> String {
    let name: String = segments
        .iter()
        .flat_map(|s| s.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect();
    format!("{api_id}{name}")
}

fn method_id(api_id: &str, binding: &RouteBinding) -> String {
    if binds_root(binding) {
        format!("{api_id}Root{}", binding.method)
    } else {
        let segments = path_segments(&binding.path);
        format!("{}{}", path_resource_id(api_id, &segments), binding.method)
    }
}

fn stage_id(api_id: &str, stage: &str) -> String {
    format!("{api_id}DeploymentStage{stage}")
}

fn reference(logical_id: &str) -> Json {
    json!({ "Ref": logical_id })
}

fn get_att(logical_id: &str, attribute: &str) -> Json {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

fn execution_role() -> Resource {
    Resource::new(
        "AWS::IAM::Role",
        json!({
            "AssumeRolePolicyDocument": {
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                }],
                "Version": "2012-10-17",
            },
            "ManagedPolicyArns": [BASIC_EXECUTION_POLICY],
        }),
    )
}

/// Join parts into a single intrinsic, merging adjacent literals.
fn join(parts: Vec<Json>) -> Json {
    let mut merged: Vec<Json> = Vec::new();
    for part in parts {
        if let (Some(Json::String(prev)), Json::String(next)) = (merged.last_mut(), &part) {
            prev.push_str(next);
            continue;
        }
        merged.push(part);
    }
    match merged.as_slice() {
        [] => Json::String(String::new()),
        [single] => single.clone(),
        _ => json!({ "Fn::Join": ["", merged] }),
    }
}

struct RenderContext<'a> {
    plan: &'a DeploymentPlan,
}

impl RenderContext<'_> {
    fn render(&self, value: &Value) -> Json {
        join(self.parts(value))
    }

    /// Flatten a value into the element list of an `Fn::Join`.
    fn parts(&self, value: &Value) -> Vec<Json> {
        match value {
            Value::Literal(s) => vec![Json::String(s.clone())],
            Value::Reference(r) => self.reference_parts(r),
            Value::Join(children) => children.iter().flat_map(|c| self.parts(c)).collect(),
        }
    }

    fn reference_parts(&self, r: &ForwardRef) -> Vec<Json> {
        let api = &self.plan.routes.api;
        if r.resource == api.logical_id && r.attribute == ATTR_URL {
            vec![
                json!("https://"),
                reference(&api.logical_id),
                json!(".execute-api."),
                reference("AWS::Region"),
                json!("."),
                reference("AWS::URLSuffix"),
                json!("/"),
                reference(&stage_id(&api.logical_id, &api.stage)),
                json!("/"),
            ]
        } else {
            vec![get_att(&r.resource, &r.attribute)]
        }
    }

    fn function_properties(
        &self,
        unit: &ComputeUnitSpec,
        artifact: &ArtifactHandle,
        role_id: &str,
    ) -> Json {
        let variables: serde_json::Map<String, Json> = unit
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), self.render(v)))
            .collect();
        let layers: Vec<&str> = unit.extensions.iter().map(|e| e.arn()).collect();

        json!({
            "Code": {
                "S3Bucket": reference(ASSET_BUCKET_PARAMETER),
                "S3Key": artifact.asset_key(),
            },
            "Handler": unit.handler,
            "Runtime": unit.runtime,
            "MemorySize": unit.memory.as_mb(),
            "Timeout": unit.timeout.as_secs(),
            "Role": get_att(role_id, "Arn"),
            "Environment": { "Variables": variables },
            "Layers": layers,
        })
    }

    /// One `AWS::ApiGateway::Resource` per segment of a non-root path,
    /// outermost first. Empty for root bindings.
    fn path_resources(&self, binding: &RouteBinding) -> Vec<(String, Resource)> {
        let api_id = &self.plan.routes.api.logical_id;
        if binds_root(binding) {
            return Vec::new();
        }
        let segments = path_segments(&binding.path);
        (1..=segments.len())
            .map(|depth| {
                let parent = if depth == 1 {
                    get_att(api_id, "RootResourceId")
                } else {
                    reference(&path_resource_id(api_id, &segments[..depth - 1]))
                };
                let resource = Resource::new(
                    "AWS::ApiGateway::Resource",
                    json!({
                        "ParentId": parent,
                        "PathPart": segments[depth - 1],
                        "RestApiId": reference(api_id),
                    }),
                );
                (path_resource_id(api_id, &segments[..depth]), resource)
            })
            .collect()
    }

    fn method(&self, binding: &RouteBinding) -> Resource {
        let api_id = &self.plan.routes.api.logical_id;
        let resource_id = if binds_root(binding) {
            get_att(api_id, "RootResourceId")
        } else {
            reference(&path_resource_id(api_id, &path_segments(&binding.path)))
        };
        let uri = join(vec![
            json!("arn:"),
            reference("AWS::Partition"),
            json!(":apigateway:"),
            reference("AWS::Region"),
            json!(":lambda:path/2015-03-31/functions/"),
            get_att(&binding.unit, "Arn"),
            json!("/invocations"),
        ]);
        Resource::new(
            "AWS::ApiGateway::Method",
            json!({
                "HttpMethod": binding.method.as_str(),
                "ResourceId": resource_id,
                "RestApiId": reference(api_id),
                "AuthorizationType": "NONE",
                "Integration": {
                    "IntegrationHttpMethod": "POST",
                    "Type": "AWS_PROXY",
                    "Uri": uri,
                },
            }),
        )
    }

    fn permission(&self, binding: &RouteBinding) -> Resource {
        let api = &self.plan.routes.api;
        let source_arn = join(vec![
            json!("arn:"),
            reference("AWS::Partition"),
            json!(":execute-api:"),
            reference("AWS::Region"),
            json!(":"),
            reference("AWS::AccountId"),
            json!(":"),
            reference(&api.logical_id),
            json!("/"),
            reference(&stage_id(&api.logical_id, &api.stage)),
            json!(format!("/{}{}", binding.method, binding.path)),
        ]);
        Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": get_att(&binding.unit, "Arn"),
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": source_arn,
            }),
        )
    }
}
