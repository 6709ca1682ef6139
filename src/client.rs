//! Traced HTTP client decorator.
//!
//! Instead of patching a process-global primitive, tracing wraps an injected
//! [`HttpClient`]: [`TracedClient`] has the same calling contract as the
//! client it wraps, so call sites are unaffected. The "installed exactly
//! once" guarantee of the original global patch is the registration check
//! every `TracedClient` performs against its [`Telemetry`] handle: only the
//! first wrapper traces, later ones pass through untouched.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response};
use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
use opentelemetry::{otel_debug, otel_warn, KeyValue};
use thiserror::Error;

use crate::attribute;
use crate::body::{classify_request_body, classify_response_body, query_string, RequestPayload};
use crate::telemetry::{set_span_attributes, SpanOptions, Telemetry};

/// Errors returned by an [`HttpClient`], boxed so implementations can
/// surface their own error types and callers observe them unchanged.
pub type HttpError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A minimal interface for sending HTTP requests.
///
/// Implementations collect the full response body; the traced wrapper reads
/// a clone of those bytes for span attributes, leaving the response handed
/// to the caller untouched.
#[async_trait]
pub trait HttpClient: fmt::Debug + Send + Sync {
    /// Send the request and return the response, status included — a non-2xx
    /// status is a response, not an error.
    ///
    /// Returns an error only when the request could not be completed, e.g.
    /// connection failure or timeout.
    async fn send(&self, request: Request<RequestPayload>) -> Result<Response<Bytes>, HttpError>;
}

/// A transport error that carries an HTTP status.
///
/// When a failed call's error chain contains one of these, its status is
/// recorded on the span; otherwise the status attribute falls back to 500.
#[derive(Debug, Error)]
#[error("request failed with status {status}")]
pub struct ResponseStatusError {
    status: u16,
}

impl ResponseStatusError {
    /// Create an error for the given status code.
    pub fn new(status: u16) -> Self {
        ResponseStatusError { status }
    }

    /// The HTTP status carried by this error.
    pub fn status(&self) -> u16 {
        self.status
    }
}

/// An [`HttpClient`] decorator that records a `CLIENT` span per request.
///
/// Requests targeting the configured collector endpoint bypass tracing
/// entirely, so exporting spans through the same client cannot recurse.
#[derive(Debug)]
pub struct TracedClient<C> {
    telemetry: Arc<Telemetry>,
    inner: C,
    tracing_enabled: bool,
}

impl<C: HttpClient> TracedClient<C> {
    /// Wrap `inner`, registering against `telemetry`.
    ///
    /// Registration is one-shot per [`Telemetry`]: if another wrapper is
    /// already registered, this one stays a transparent pass-through, so
    /// accidentally wrapping twice still produces at most one span per call.
    pub fn new(telemetry: Arc<Telemetry>, inner: C) -> Self {
        let tracing_enabled = telemetry.register_interceptor();
        if !tracing_enabled {
            otel_warn!(name: "TracedClient.AlreadyRegistered");
        }
        TracedClient {
            telemetry,
            inner,
            tracing_enabled,
        }
    }

    /// Consume the wrapper and return the inner client.
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn request_attributes(&self, request: &Request<RequestPayload>, url: &str) -> Vec<KeyValue> {
        let mut attributes = vec![
            KeyValue::new(attribute::HTTP_METHOD, request.method().as_str().to_owned()),
            KeyValue::new(attribute::HTTP_URL, url.to_owned()),
            KeyValue::new(attribute::HTTP_PATH, request.uri().path().to_owned()),
        ];
        if let Some(host) = request.uri().host() {
            attributes.push(KeyValue::new(attribute::HTTP_HOST, host.to_owned()));
        }
        let classified = classify_request_body(request.body());
        if let Some(body) = classified.body {
            attributes.push(KeyValue::new(attribute::HTTP_REQUEST_BODY, body));
        }
        if let Some(body_type) = classified.body_type {
            attributes.push(KeyValue::new(
                attribute::HTTP_REQUEST_BODY_TYPE,
                body_type.into_owned(),
            ));
        }
        if request.method() == Method::GET {
            if let Some(query) = query_string(request.uri()) {
                attributes.push(KeyValue::new(attribute::HTTP_QUERY_PARAMS, query));
            }
        }
        attributes
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for TracedClient<C> {
    async fn send(&self, request: Request<RequestPayload>) -> Result<Response<Bytes>, HttpError> {
        if !self.tracing_enabled {
            return self.inner.send(request).await;
        }

        let url = request.uri().to_string();
        if url.contains(self.telemetry.config().collector_url()) {
            // collector traffic is never traced
            return match self.inner.send(request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    otel_debug!(name: "TracedClient.CollectorRequestFailed",
                            error = format!("{err}"));
                    Err(err)
                }
            };
        }

        let name = format!("HTTP {}", request.method());
        let options = SpanOptions {
            kind: SpanKind::Client,
            attributes: self.request_attributes(&request, &url),
            parent: None,
        };
        let debug = self.telemetry.config().debug();
        let inner = &self.inner;

        self.telemetry
            .with_span(name, options, |cx| async move {
                match inner.send(request).await {
                    Ok(response) => {
                        let status = response.status();
                        cx.span().set_attribute(KeyValue::new(
                            attribute::HTTP_STATUS_CODE,
                            i64::from(status.as_u16()),
                        ));
                        if status.as_u16() >= 400 {
                            cx.span()
                                .set_status(Status::error(format!("HTTP status {}", status.as_u16())));
                        } else {
                            cx.span().set_status(Status::Ok);
                        }
                        let classified = classify_response_body(&response);
                        let mut attributes = Vec::with_capacity(2);
                        if let Some(body) = classified.body {
                            attributes.push(KeyValue::new(attribute::HTTP_RESPONSE, body));
                        }
                        if let Some(body_type) = classified.body_type {
                            attributes.push(KeyValue::new(
                                attribute::HTTP_RESPONSE_TYPE,
                                body_type.into_owned(),
                            ));
                        }
                        set_span_attributes(&cx, attributes);
                        if debug {
                            otel_debug!(name: "TracedClient.Response",
                                    url = url, status = u64::from(status.as_u16()));
                        }
                        Ok(response)
                    }
                    Err(err) => {
                        cx.span().set_attribute(KeyValue::new(
                            attribute::HTTP_ERROR,
                            err.to_string(),
                        ));
                        cx.span().set_attribute(KeyValue::new(
                            attribute::HTTP_STATUS_CODE,
                            error_status_code(&err),
                        ));
                        Err(err)
                    }
                }
            })
            .await
    }
}

/// Status recorded for a failed call: the status carried by a
/// [`ResponseStatusError`] in the chain, or 500 when there is none.
fn error_status_code(err: &HttpError) -> i64 {
    err.downcast_ref::<ResponseStatusError>()
        .map(|err| i64::from(err.status()))
        .unwrap_or(500)
}

#[cfg(feature = "reqwest")]
mod reqwest {
    use http::header::CONTENT_TYPE;

    use super::{async_trait, Bytes, HttpClient, HttpError, Request, RequestPayload, Response};

    #[async_trait]
    impl HttpClient for reqwest::Client {
        async fn send(&self, request: Request<RequestPayload>) -> Result<Response<Bytes>, HttpError> {
            let (parts, payload) = request.into_parts();
            let mut builder = self
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers);
            builder = match payload {
                RequestPayload::Empty | RequestPayload::Unknown { .. } => builder,
                RequestPayload::Text(text) => builder.body(text),
                RequestPayload::UrlEncoded(body) => builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(body),
                RequestPayload::Binary(data) => builder.body(data),
                RequestPayload::Blob { media_type, data } => {
                    builder.header(CONTENT_TYPE, media_type).body(data)
                }
                RequestPayload::Form(fields) => {
                    let mut form = reqwest::multipart::Form::new();
                    for (name, value) in fields {
                        form = form.text(name, value);
                    }
                    builder.multipart(form)
                }
            };
            // no error_for_status here: a non-2xx response must reach the
            // caller (and the span) as a response
            let mut response = builder.send().await?;
            let headers = std::mem::take(response.headers_mut());
            let mut http_response = Response::builder()
                .status(response.status())
                .body(response.bytes().await?)?;
            *http_response.headers_mut() = headers;

            Ok(http_response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_prefers_typed_status() {
        let err: HttpError = Box::new(ResponseStatusError::new(503));
        assert_eq!(error_status_code(&err), 503);
    }

    #[test]
    fn error_status_defaults_to_500() {
        let err: HttpError =
            Box::new(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(error_status_code(&err), 500);
    }
}
