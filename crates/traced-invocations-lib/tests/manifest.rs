use serde_json::json;

use traced_invocations_lib::resolver::{HELLO_WORLD_LOGICAL_ID, INVOKER_LOGICAL_ID};
use std::path::PathBuf;

use traced_invocations_lib::{
    resolve, synthesize, ArtifactHandle, ArtifactSet, EnvironmentInputs, Error, HttpMethod,
    RouteBinding, StagedArtifacts, Template, DATADOG_EXTENSION_ARN,
};

fn synth(inputs: &EnvironmentInputs) -> Template {
    let plan = resolve(inputs).expect("plan resolves");
    let artifacts =
        ArtifactSet::build_all(&StagedArtifacts::new("cdk.out"), &plan).expect("staged");
    synthesize(&plan, &artifacts).expect("template synthesizes")
}

fn api_url_parts() -> serde_json::Value {
    json!([
        "https://",
        { "Ref": "tracedInvocationsAPI" },
        ".execute-api.",
        { "Ref": "AWS::Region" },
        ".",
        { "Ref": "AWS::URLSuffix" },
        "/",
        { "Ref": "tracedInvocationsAPIDeploymentStageprod" },
        "/"
    ])
}

#[test]
fn template_declares_expected_resources() {
    let template = synth(&EnvironmentInputs::default());

    assert_eq!(
        template.resources_of_type("AWS::Lambda::Function"),
        vec![HELLO_WORLD_LOGICAL_ID, INVOKER_LOGICAL_ID]
    );
    assert_eq!(
        template.resources_of_type("AWS::ApiGateway::RestApi"),
        vec!["tracedInvocationsAPI"]
    );
    assert_eq!(
        template.resources_of_type("AWS::ApiGateway::Method"),
        vec!["tracedInvocationsAPIRootGET"]
    );
    assert_eq!(template.resources_of_type("AWS::IAM::Role").len(), 2);
    assert_eq!(template.resources_of_type("AWS::Lambda::Permission").len(), 1);
    assert!(template
        .resource("tracedInvocationsAPIDeploymentStageprod")
        .is_some());
}

#[test]
fn functions_carry_extension_layer_and_sizing() {
    let template = synth(&EnvironmentInputs::default());
    for id in [HELLO_WORLD_LOGICAL_ID, INVOKER_LOGICAL_ID] {
        let props = &template.resource(id).unwrap().properties;
        assert_eq!(props["Layers"], json!([DATADOG_EXTENSION_ARN]));
        assert_eq!(props["MemorySize"], 128);
        assert_eq!(props["Timeout"], 30);
        assert_eq!(props["Runtime"], "provided.al2023");
        assert_eq!(props["Handler"], "bootstrap");
    }
}

#[test]
fn invoker_target_url_is_an_intrinsic() {
    let template = synth(&EnvironmentInputs::default());
    let vars = &template.resource(INVOKER_LOGICAL_ID).unwrap().properties["Environment"]
        ["Variables"];

    assert!(vars["TARGET_API_URL"].is_object());
    assert_eq!(vars["TARGET_API_URL"], json!({ "Fn::Join": ["", api_url_parts()] }));
    assert_eq!(vars["DD_SERVICE"], "traced-invocations-invoker");

    let hello_vars = &template.resource(HELLO_WORLD_LOGICAL_ID).unwrap().properties
        ["Environment"]["Variables"];
    assert!(hello_vars.get("TARGET_API_URL").is_none());
}

#[test]
fn invoker_output_appends_suffix_to_api_expression() {
    let template = synth(&EnvironmentInputs::default());

    let api = &template.outputs["ApiUrl"];
    assert_eq!(api.value, json!({ "Fn::Join": ["", api_url_parts()] }));
    assert_eq!(api.description, "URL of the API Gateway");

    let mut invoke_parts = api_url_parts();
    let parts = invoke_parts.as_array_mut().unwrap();
    parts.pop();
    parts.push(json!("/invoke"));
    assert_eq!(
        template.outputs["InvokerUrl"].value,
        json!({ "Fn::Join": ["", invoke_parts] })
    );
}

#[test]
fn environment_metadata_reflects_target() {
    let explicit = EnvironmentInputs::new(
        Some("111122223333".into()),
        Some("us-west-2".into()),
        Some("abcd".into()),
    );
    assert_eq!(
        synth(&explicit).metadata["Environment"],
        "aws://111122223333/us-west-2"
    );
    assert_eq!(
        synth(&EnvironmentInputs::default()).metadata["Environment"],
        "aws://unknown-account/unknown-region"
    );
}

#[test]
fn missing_artifact_fails_synthesis() {
    let plan = resolve(&EnvironmentInputs::default()).unwrap();
    let err = synthesize(&plan, &ArtifactSet::new()).unwrap_err();
    assert!(matches!(err, Error::MissingArtifact { ref unit } if unit == HELLO_WORLD_LOGICAL_ID));
}

#[test]
fn template_serializes_with_cloudformation_keys() {
    let template = synth(&EnvironmentInputs::default());
    let text = template.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
    assert_eq!(
        value["Resources"][HELLO_WORLD_LOGICAL_ID]["Type"],
        "AWS::Lambda::Function"
    );
    assert_eq!(
        value["Resources"][HELLO_WORLD_LOGICAL_ID]["DependsOn"],
        json!(["HelloWorldFunctionServiceRole"])
    );
    assert_eq!(
        value["Resources"][HELLO_WORLD_LOGICAL_ID]["Metadata"]["aws:asset:path"],
        "cdk.out/hello-world"
    );
}

#[test]
fn nested_route_declares_path_resources() {
    let mut plan = resolve(&EnvironmentInputs::default()).unwrap();
    plan.routes.bindings.push(RouteBinding {
        unit: INVOKER_LOGICAL_ID.to_string(),
        method: HttpMethod::Get,
        path: "/invoke/now".to_string(),
        is_root: false,
    });
    let artifacts = ArtifactSet::build_all(&StagedArtifacts::new("cdk.out"), &plan).unwrap();
    let template = synthesize(&plan, &artifacts).unwrap();

    assert_eq!(
        template.resources_of_type("AWS::ApiGateway::Resource"),
        vec!["tracedInvocationsAPIinvoke", "tracedInvocationsAPIinvokenow"]
    );
    let outer = &template.resource("tracedInvocationsAPIinvoke").unwrap().properties;
    assert_eq!(
        outer["ParentId"],
        json!({ "Fn::GetAtt": ["tracedInvocationsAPI", "RootResourceId"] })
    );
    assert_eq!(outer["PathPart"], "invoke");
    let inner = &template.resource("tracedInvocationsAPIinvokenow").unwrap().properties;
    assert_eq!(inner["ParentId"], json!({ "Ref": "tracedInvocationsAPIinvoke" }));
    assert_eq!(inner["PathPart"], "now");

    let method = &template.resource("tracedInvocationsAPIinvokenowGET").unwrap().properties;
    assert_eq!(method["ResourceId"], json!({ "Ref": "tracedInvocationsAPIinvokenow" }));
}

#[test]
fn root_only_plan_declares_no_path_resources() {
    let template = synth(&EnvironmentInputs::default());
    assert!(template.resources_of_type("AWS::ApiGateway::Resource").is_empty());
}

#[test]
fn code_key_follows_artifact_location() {
    let plan = resolve(&EnvironmentInputs::default()).unwrap();
    let mut artifacts = ArtifactSet::new();
    for (unit, dir) in [(HELLO_WORLD_LOGICAL_ID, "hw-build"), (INVOKER_LOGICAL_ID, "inv-build")] {
        artifacts.insert(ArtifactHandle {
            unit: unit.to_string(),
            location: PathBuf::from("dist").join(dir),
        });
    }
    let template = synthesize(&plan, &artifacts).unwrap();

    let code = &template.resource(HELLO_WORLD_LOGICAL_ID).unwrap().properties["Code"];
    assert_eq!(code["S3Key"], "hw-build/bootstrap.zip");
    assert_eq!(code["S3Bucket"], json!({ "Ref": "AssetBucket" }));
    let code = &template.resource(INVOKER_LOGICAL_ID).unwrap().properties["Code"];
    assert_eq!(code["S3Key"], "inv-build/bootstrap.zip");
}
