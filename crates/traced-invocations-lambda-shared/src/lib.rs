//! Shared infrastructure for the traced invocations AWS Lambda functions.
//!
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`ProxyRequest`] / [`ProxyResponse`]: API Gateway proxy integration shapes
//! - [`ProblemDetails`]: RFC 9457 Problem Details for consistent error bodies
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides proxy event fixtures. Enable the
//! `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

mod problem;
mod requests;
mod response;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use problem::{
    ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_MISCONFIGURED, PROBLEM_UPSTREAM_FAILURE,
};
pub use requests::{ProxyRequest, RequestContext};
pub use response::{ProxyResponse, CONTENT_TYPE_JSON, CONTENT_TYPE_PROBLEM};
pub use tracing_init::init_tracing;

/// Header naming what instrumented the function.
pub const INSTRUMENTED_BY_HEADER: &str = "X-Instrumented-By";

/// Value of [`INSTRUMENTED_BY_HEADER`].
pub const INSTRUMENTED_BY: &str = "Datadog-Lambda-Extension";
