//! Test utilities for Lambda handler testing.
//!
//! Enable the `test-utils` feature to use these from dependent crates:
//!
//! ```ignore
//! use traced_invocations_lambda_shared::test_utils::{mock_request_id, proxy_event};
//!
//! #[test]
//! fn test_handler() {
//!     let event = proxy_event("GET", "/", Some("{}"));
//!     let request_id = mock_request_id("hello");
//!     // ... test handler logic
//! }
//! ```

use serde_json::{json, Value};

/// Create a mock request ID for testing.
///
/// `lambda_runtime::Context` is non-exhaustive and cannot be constructed
/// directly, so handlers take the request id separately.
pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{}", suffix)
}

/// Fixed API Gateway request time used by [`proxy_event`].
pub const FIXTURE_REQUEST_TIME: &str = "16/Oct/2026:12:00:00 +0000";

/// Fixed API Gateway request id used by [`proxy_event`].
pub const FIXTURE_GATEWAY_REQUEST_ID: &str = "gw-fixture-request";

/// Raw proxy event payload, as the Lambda runtime would hand it over.
pub fn proxy_event(method: &str, path: &str, body: Option<&str>) -> Value {
    json!({
        "resource": path,
        "path": path,
        "httpMethod": method,
        "headers": { "Accept": "application/json" },
        "queryStringParameters": null,
        "requestContext": {
            "requestId": FIXTURE_GATEWAY_REQUEST_ID,
            "requestTime": FIXTURE_REQUEST_TIME,
            "stage": "prod"
        },
        "body": body,
        "isBase64Encoded": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProxyRequest;

    #[test]
    fn mock_request_id_formats_correctly() {
        assert_eq!(mock_request_id("123"), "test-request-123");
    }

    #[test]
    fn proxy_event_parses() {
        let request = ProxyRequest::from_payload(proxy_event("GET", "/", Some("abc"))).unwrap();
        assert_eq!(request.request_context.request_time, FIXTURE_REQUEST_TIME);
        assert_eq!(request.body_len(), 3);
    }
}
