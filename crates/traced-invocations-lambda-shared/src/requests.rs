//! API Gateway proxy integration events.
//!
//! Only the fields the handlers read are modelled; everything else in the
//! event is ignored during deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// REST API proxy event, as delivered by an `AWS_PROXY` integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub http_method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default)]
    pub request_context: RequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// The `requestContext` block of a proxy event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// API Gateway's id for the request (distinct from the Lambda request id).
    #[serde(default)]
    pub request_id: String,
    /// CLF-formatted request time, e.g. `09/Apr/2015:12:34:56 +0000`.
    #[serde(default)]
    pub request_time: String,
    #[serde(default)]
    pub stage: String,
}

impl ProxyRequest {
    /// Parse a raw Lambda payload into a proxy event.
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }

    /// Length of the request body in bytes (zero when absent).
    pub fn body_len(&self) -> usize {
        self.body.as_deref().map(str::len).unwrap_or(0)
    }
}

/// API Gateway sends `null` rather than `{}` for empty maps.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_proxy_event() {
        let request = ProxyRequest::from_payload(json!({
            "resource": "/",
            "path": "/",
            "httpMethod": "GET",
            "headers": null,
            "queryStringParameters": null,
            "requestContext": {
                "requestId": "c6af9ac6-7b61-11e6-9a41-93e8deadbeef",
                "requestTime": "09/Apr/2015:12:34:56 +0000",
                "stage": "prod"
            },
            "body": null,
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(request.http_method, "GET");
        assert!(request.headers.is_empty());
        assert_eq!(
            request.request_context.request_id,
            "c6af9ac6-7b61-11e6-9a41-93e8deadbeef"
        );
        assert_eq!(request.body_len(), 0);
    }

    #[test]
    fn tolerates_empty_payload() {
        let request = ProxyRequest::from_payload(json!({})).unwrap();
        assert_eq!(request, ProxyRequest::default());
    }

    #[test]
    fn rejects_wrongly_typed_fields() {
        assert!(ProxyRequest::from_payload(json!({ "path": 42 })).is_err());
    }

    #[test]
    fn body_len_counts_bytes() {
        let request = ProxyRequest {
            body: Some("héllo".to_string()),
            ..ProxyRequest::default()
        };
        assert_eq!(request.body_len(), 6);
    }
}
