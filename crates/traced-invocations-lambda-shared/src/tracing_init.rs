//! Tracing initialization for Lambda functions.
//!
//! Emits one flattened JSON object per event so that CloudWatch Logs (and
//! the tracing extension tailing them) can index the structured fields.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info";

/// Initialize JSON tracing for a Lambda function.
///
/// Call once at the start of `main`, before `lambda_runtime::run()`. Later
/// calls are ignored, which keeps handler tests free to call it too.
///
/// ```no_run
/// use traced_invocations_lambda_shared::init_tracing;
///
/// #[tokio::main]
/// async fn main() -> Result<(), lambda_runtime::Error> {
///     init_tracing();
///     // ... rest of Lambda setup
///     Ok(())
/// }
/// ```
pub fn init_tracing() {
    let fmt_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_current_span(false)
        .without_time()
        .flatten_event(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(fmt_layer)
        .try_init();
}

fn env_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
