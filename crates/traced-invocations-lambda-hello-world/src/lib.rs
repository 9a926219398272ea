//! AWS Lambda function behind the root `GET` route of the traced
//! invocations API.
//!
//! Echoes the API Gateway request id and request time back to the caller so
//! that the invoker can correlate its outbound call with this invocation.

use http::StatusCode;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use traced_invocations_lambda_shared::{
    init_tracing, ProblemDetails, ProxyRequest, ProxyResponse, INSTRUMENTED_BY,
    INSTRUMENTED_BY_HEADER,
};

pub const GREETING: &str = "Hello World from the traced invocations Rust Lambda!";

/// Body returned on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloResponse {
    pub message: String,
    pub request_id: String,
    pub timestamp: String,
    pub tracing: String,
}

/// Entry point used by the Lambda runtime.
pub async fn run() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handler)).await
}

/// Lambda handler invoked per request.
pub async fn handler(event: LambdaEvent<Value>) -> Result<ProxyResponse, Error> {
    let request_id = event.context.request_id.clone();

    let request = match ProxyRequest::from_payload(event.payload) {
        Ok(req) => req,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "failed to parse proxy event");
            return Ok(ProblemDetails::internal_error(
                format!("Invalid proxy event: {}", e),
                &request_id,
            )
            .into());
        }
    };

    Ok(handle_request(&request, &request_id))
}

/// Core handler logic separated for reuse in tests.
pub fn handle_request(request: &ProxyRequest, request_id: &str) -> ProxyResponse {
    info!(
        request_id = %request_id,
        gateway_request_id = %request.request_context.request_id,
        body_size = request.body_len(),
        "processing request"
    );

    let body = HelloResponse {
        message: GREETING.to_string(),
        request_id: request.request_context.request_id.clone(),
        timestamp: request.request_context.request_time.clone(),
        tracing: "Traced by the Datadog Lambda extension".to_string(),
    };

    match ProxyResponse::json(StatusCode::OK, &body) {
        Ok(response) => response
            .with_header("Access-Control-Allow-Origin", "*")
            .with_header(INSTRUMENTED_BY_HEADER, INSTRUMENTED_BY),
        Err(e) => {
            error!(request_id = %request_id, error = %e, "failed to serialize response");
            ProblemDetails::internal_error("Failed to marshal response", request_id).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traced_invocations_lambda_shared::test_utils::{
        mock_request_id, proxy_event, FIXTURE_GATEWAY_REQUEST_ID, FIXTURE_REQUEST_TIME,
    };
    use traced_invocations_lambda_shared::CONTENT_TYPE_JSON;

    fn request(body: Option<&str>) -> ProxyRequest {
        ProxyRequest::from_payload(proxy_event("GET", "/", body)).unwrap()
    }

    #[test]
    fn responds_with_greeting_and_gateway_ids() {
        let response = handle_request(&request(None), &mock_request_id("hello"));
        assert_eq!(response.status_code, 200);

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["message"], GREETING);
        assert_eq!(body["requestId"], FIXTURE_GATEWAY_REQUEST_ID);
        assert_eq!(body["timestamp"], FIXTURE_REQUEST_TIME);
        assert!(body["tracing"].as_str().unwrap().contains("Datadog"));
    }

    #[test]
    fn sets_cors_and_instrumentation_headers() {
        let response = handle_request(&request(Some("{}")), &mock_request_id("headers"));
        assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(response.header(INSTRUMENTED_BY_HEADER), Some(INSTRUMENTED_BY));
    }

    #[test]
    fn missing_request_context_still_succeeds() {
        let response = handle_request(&ProxyRequest::default(), &mock_request_id("bare"));
        assert!(response.is_success());
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["requestId"], "");
    }
}
