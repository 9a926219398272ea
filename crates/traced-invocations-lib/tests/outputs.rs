use traced_invocations_lib::resolver::{API_URL_OUTPUT, INVOKER_URL_OUTPUT};
use traced_invocations_lib::{resolve, Bindings, EnvironmentInputs, Error, INVOKE_PATH_SUFFIX};

fn plan() -> traced_invocations_lib::DeploymentPlan {
    resolve(&EnvironmentInputs::default()).expect("plan resolves")
}

#[test]
fn invoker_url_is_api_url_plus_suffix() {
    let plan = plan();
    for base in [
        "https://abc123.execute-api.us-west-2.amazonaws.com/prod/",
        "http://localhost:3000/",
        "no-trailing-slash",
        "",
    ] {
        let outputs = plan
            .resolve_outputs(&plan.bindings_for_base_address(base))
            .expect("outputs render");
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], (API_URL_OUTPUT.to_string(), base.to_string()));
        assert_eq!(
            outputs[1],
            (
                INVOKER_URL_OUTPUT.to_string(),
                format!("{base}{INVOKE_PATH_SUFFIX}")
            )
        );
    }
}

#[test]
fn empty_base_address_yields_bare_suffix() {
    let plan = plan();
    let outputs = plan
        .resolve_outputs(&plan.bindings_for_base_address(""))
        .unwrap();
    assert_eq!(outputs[1].1, "invoke");
}

#[test]
fn outputs_require_materialized_address() {
    let err = plan().resolve_outputs(&Bindings::new()).unwrap_err();
    assert!(matches!(err, Error::UnboundReference { .. }));
}

#[test]
fn no_invoke_route_is_declared() {
    // The invoke output is a plain concatenation; only the root route exists.
    let plan = plan();
    assert!(plan.routes.bindings.iter().all(|b| b.path == "/"));
    assert!(plan.output(INVOKER_URL_OUTPUT).is_some());
}
