//! API Gateway proxy integration responses.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::problem::ProblemDetails;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_PROBLEM: &str = "application/problem+json";

/// Response shape expected by an `AWS_PROXY` integration.
///
/// ```
/// use http::StatusCode;
/// use traced_invocations_lambda_shared::ProxyResponse;
///
/// let response = ProxyResponse::json(StatusCode::OK, &serde_json::json!({ "ok": true }))
///     .unwrap()
///     .with_header("Access-Control-Allow-Origin", "*");
/// assert_eq!(response.status_code, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// Serialize `data` as a JSON body.
    pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: status.as_u16(),
            headers: BTreeMap::new(),
            body: serde_json::to_string(data)?,
            is_base64_encoded: false,
        }
        .with_header("Content-Type", CONTENT_TYPE_JSON))
    }

    /// Error response with a problem details body.
    pub fn problem(problem: &ProblemDetails) -> Self {
        // ProblemDetails only holds strings and integers.
        let body = serde_json::to_string(problem).unwrap_or_else(|_| {
            format!(r#"{{"title":"{}","status":{}}}"#, problem.title, problem.status)
        });
        Self {
            status_code: problem.status,
            headers: BTreeMap::new(),
            body,
            is_base64_encoded: false,
        }
        .with_header("Content-Type", CONTENT_TYPE_PROBLEM)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

impl From<ProblemDetails> for ProxyResponse {
    fn from(problem: ProblemDetails) -> Self {
        Self::problem(&problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    struct TestData {
        value: i32,
    }

    #[test]
    fn json_response_sets_content_type() {
        let response = ProxyResponse::json(StatusCode::OK, &TestData { value: 42 }).unwrap();
        assert_eq!(response.body, r#"{"value":42}"#);
        assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE_JSON));
        assert!(response.is_success());
    }

    #[test]
    fn serializes_with_proxy_field_names() {
        let response = ProxyResponse::json(StatusCode::OK, &TestData { value: 1 }).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["isBase64Encoded"], false);
        assert_eq!(json["headers"]["Content-Type"], CONTENT_TYPE_JSON);
    }

    #[test]
    fn problem_response_uses_problem_status() {
        let response: ProxyResponse = ProblemDetails::upstream_failure("boom", "req-9").into();
        assert_eq!(response.status_code, 500);
        assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE_PROBLEM));
        assert!(response.body.contains("\"instance\":\"req-9\""));
        assert!(!response.is_success());
    }
}
