//! AWS Lambda function that calls the hello-world function through the
//! public API.
//!
//! The API base address is only known after deployment, so it arrives via the
//! `TARGET_API_URL` environment variable. The invoker issues a `GET` against
//! it, times the round trip, and reports what came back.

use std::env;
use std::time::{Duration, Instant};

use http::StatusCode;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use traced_invocations_lambda_shared::{
    init_tracing, ProblemDetails, ProxyRequest, ProxyResponse, INSTRUMENTED_BY,
    INSTRUMENTED_BY_HEADER,
};

/// Environment variable carrying the API base address.
pub const TARGET_API_URL_VAR: &str = "TARGET_API_URL";

/// Upper bound on the outbound call; matches the function timeout.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const SUCCESS_MESSAGE: &str = "Successfully invoked hello-world lambda via HTTP";

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
});

/// Configuration read once per cold start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokerConfig {
    pub target_url: Option<String>,
}

impl InvokerConfig {
    pub fn from_env() -> Self {
        Self::new(env::var(TARGET_API_URL_VAR).ok())
    }

    pub fn new(target_url: Option<String>) -> Self {
        Self {
            target_url: target_url.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// Body returned on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokerResult {
    pub message: String,
    pub request_id: String,
    /// Parsed JSON body of the target, or its raw text if it was not JSON.
    pub invocation_result: Value,
    pub response_time: String,
    pub http_status_code: u16,
    pub api_gateway_url: String,
}

impl InvokerResult {
    pub fn new(
        request_id: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        body: &[u8],
        elapsed: Duration,
    ) -> Self {
        let invocation_result = serde_json::from_slice(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            request_id: request_id.into(),
            invocation_result,
            response_time: format!("{:?}", elapsed),
            http_status_code: status,
            api_gateway_url: url.into(),
        }
    }
}

/// Entry point used by the Lambda runtime.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    let config = InvokerConfig::from_env();
    log_config(&config);
    let config = &config;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(event, config).await
    }))
    .await
}

fn log_config(config: &InvokerConfig) {
    match config.target_url.as_deref() {
        Some(url) => info!(target_url = %url, "invoker configured"),
        None => warn!(
            var = TARGET_API_URL_VAR,
            "target URL not set; every invocation will fail"
        ),
    }
}

/// Lambda handler invoked per request.
pub async fn handler(
    event: LambdaEvent<Value>,
    config: &InvokerConfig,
) -> Result<ProxyResponse, Error> {
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

    Ok(handle_request(&HTTP_CLIENT, config, &request, &request_id).await)
}

/// Core handler logic separated for reuse in tests.
pub async fn handle_request(
    client: &reqwest::Client,
    config: &InvokerConfig,
    request: &ProxyRequest,
    request_id: &str,
) -> ProxyResponse {
    info!(
        request_id = %request_id,
        gateway_request_id = %request.request_context.request_id,
        "invoker processing request"
    );

    let Some(url) = config.target_url.as_deref() else {
        error!(request_id = %request_id, "target URL not configured");
        return ProblemDetails::misconfigured(
            format!("{} environment variable not set", TARGET_API_URL_VAR),
            request_id,
        )
        .into();
    };

    let started = Instant::now();
    let response = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            error!(request_id = %request_id, target_url = %url, error = %e, "target invocation failed");
            return ProblemDetails::upstream_failure(
                format!("Failed to invoke target lambda: {}", e),
                request_id,
            )
            .into();
        }
    };
    let status = response.status().as_u16();
    let body = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "failed to read target response");
            return ProblemDetails::upstream_failure(
                format!("Failed to read response: {}", e),
                request_id,
            )
            .into();
        }
    };
    let elapsed = started.elapsed();

    info!(
        request_id = %request_id,
        http_status = status,
        elapsed_ms = elapsed.as_millis() as u64,
        "target invoked"
    );

    let result = InvokerResult::new(
        request.request_context.request_id.clone(),
        url,
        status,
        &body,
        elapsed,
    );
    success_response(&result, request_id)
}

fn success_response(result: &InvokerResult, request_id: &str) -> ProxyResponse {
    match ProxyResponse::json(StatusCode::OK, result) {
        Ok(response) => response
            .with_header("Access-Control-Allow-Origin", "*")
            .with_header(INSTRUMENTED_BY_HEADER, INSTRUMENTED_BY)
            .with_header("X-Invoked-Target", "hello-world-lambda"),
        Err(e) => {
            error!(request_id = %request_id, error = %e, "failed to serialize response");
            ProblemDetails::internal_error("Failed to marshal response", request_id).into()
        }
    }
}
