//! # OpenTelemetry HTTP Client Instrumentation
//!
//! Records every outbound HTTP request/response pair made through an
//! instrumented client as an OpenTelemetry `CLIENT` span, without changing
//! the caller-visible behavior of the client.
//!
//! Instrumentation is a decorator: bring any [`HttpClient`] implementation
//! and wrap it in a [`TracedClient`] bound to a [`Telemetry`] handle. The
//! handle owns the validated [`TelemetryConfig`], the tracer used for span
//! creation, and the one-time registration guard that keeps a call chain
//! from ever being traced twice.
//!
//! ```no_run
//! use std::sync::Arc;
//! use opentelemetry::global;
//! use opentelemetry_instrumentation_http::{Telemetry, TelemetryConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TelemetryConfig::builder()
//!     .with_api_key("secret")
//!     .with_service_name("storefront")
//!     .with_service_version("1.4.2")
//!     .with_collector_url("https://collector.example.com/v1/traces")
//!     .build()?;
//!
//! let telemetry = Arc::new(Telemetry::new(config));
//! telemetry.set_tracer(global::tracer("http-client"));
//! // wrap any `HttpClient` in `TracedClient::new(telemetry, client)` and use
//! // it exactly like the inner client; spans are emitted per call
//! # Ok(())
//! # }
//! ```
//!
//! Requests whose URL targets the configured collector endpoint are never
//! traced, so exporting finished spans through the same client cannot loop.
//!
//! ## Crate Feature Flags
//!
//! * `reqwest`: implements [`HttpClient`] for `reqwest::Client`.
//! * `internal-logs` (default): instrumentation-internal logging through the
//!   `opentelemetry` logging macros.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(test, deny(warnings))]

pub mod attribute;
mod body;
mod client;
mod config;
mod telemetry;

pub use body::{
    classify_request_body, classify_response_body, query_string, ClassifiedBody, RequestPayload,
};
pub use client::{HttpClient, HttpError, ResponseStatusError, TracedClient};
pub use config::{ConfigError, TelemetryConfig, TelemetryConfigBuilder};
pub use telemetry::{set_span_attributes, SpanOptions, Telemetry};
