//! Span lifecycle engine.
//!
//! [`Telemetry`] is the one explicitly-constructed instrumentation context:
//! it owns the validated configuration, the tracer used to start spans, and
//! the registration guard consulted by [`TracedClient`](crate::TracedClient).
//! [`Telemetry::with_span`] / [`Telemetry::with_span_sync`] and
//! [`set_span_attributes`] are the only span surface in this crate; the
//! traced client and any sibling trackers go through them rather than
//! constructing spans themselves.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use opentelemetry::global::BoxedTracer;
use opentelemetry::trace::{FutureExt, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};

use crate::config::TelemetryConfig;

/// Options for a span started through [`Telemetry::with_span`].
#[derive(Debug)]
pub struct SpanOptions {
    /// Span kind. Defaults to [`SpanKind::Internal`].
    pub kind: SpanKind,
    /// Attributes set at span start.
    pub attributes: Vec<KeyValue>,
    /// Explicit parent context. When `None`, the ambient current context is
    /// the parent.
    pub parent: Option<Context>,
}

impl Default for SpanOptions {
    fn default() -> Self {
        SpanOptions {
            kind: SpanKind::Internal,
            attributes: Vec::new(),
            parent: None,
        }
    }
}

/// Shared instrumentation state, constructed once at startup.
///
/// The tracer slot is written once (first [`set_tracer`](Self::set_tracer)
/// wins) and read on every traced call. When no tracer has been set, every
/// operation degrades to a no-op and the instrumented code runs unchanged.
/// [`reset`](Self::reset) returns the handle to its initial state for test
/// isolation.
#[derive(Debug)]
pub struct Telemetry {
    config: TelemetryConfig,
    tracer: RwLock<Option<Arc<BoxedTracer>>>,
    interceptor_registered: AtomicBool,
}

impl Telemetry {
    /// Create a handle with the given configuration and no tracer.
    pub fn new(config: TelemetryConfig) -> Self {
        Telemetry {
            config,
            tracer: RwLock::new(None),
            interceptor_registered: AtomicBool::new(false),
        }
    }

    /// The configuration this handle was built with.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Install the tracer used for span creation.
    ///
    /// Only the first call has an effect; later calls are ignored so a
    /// tracer cannot be swapped out from under in-flight spans.
    pub fn set_tracer(&self, tracer: BoxedTracer) {
        if let Ok(mut slot) = self.tracer.write() {
            if slot.is_none() {
                *slot = Some(Arc::new(tracer));
            }
        }
    }

    /// Clear the tracer and the interceptor registration.
    ///
    /// Intended for test isolation; production code sets up a `Telemetry`
    /// once and never resets it.
    pub fn reset(&self) {
        if let Ok(mut slot) = self.tracer.write() {
            *slot = None;
        }
        self.interceptor_registered.store(false, Ordering::SeqCst);
    }

    /// Whether a tracer has been installed.
    pub fn has_tracer(&self) -> bool {
        self.tracer().is_some()
    }

    /// One-shot registration check for the traced client. Returns `true`
    /// for the first caller only.
    pub(crate) fn register_interceptor(&self) -> bool {
        !self.interceptor_registered.swap(true, Ordering::SeqCst)
    }

    fn tracer(&self) -> Option<Arc<BoxedTracer>> {
        self.tracer.read().ok().and_then(|slot| slot.clone())
    }

    /// Run an async unit of work inside a span.
    ///
    /// With no tracer installed, `body` runs directly under the current
    /// (span-less) context. Otherwise a child span of the parent context is
    /// started and kept active across every suspension point of `body`'s
    /// future, so concurrent traced calls each keep their own parentage.
    ///
    /// On `Err` the span status is set to error with the error's display
    /// message and the original error value is handed back unchanged. The
    /// span is ended exactly once on every path, after status is finalized.
    pub async fn with_span<T, E, F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        options: SpanOptions,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let Some(tracer) = self.tracer() else {
            return body(Context::current()).await;
        };
        let cx = start_span(&tracer, name.into(), options);

        let result = body(cx.clone()).with_context(cx.clone()).await;

        if let Err(err) = &result {
            cx.span().set_status(Status::error(err.to_string()));
        }
        cx.span().end();
        result
    }

    /// Synchronous variant of [`with_span`](Self::with_span); identical
    /// contract, with the span active for the duration of the closure.
    pub fn with_span_sync<T, E, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        options: SpanOptions,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Context) -> Result<T, E>,
        E: fmt::Display,
    {
        let Some(tracer) = self.tracer() else {
            return body(&Context::current());
        };
        let cx = start_span(&tracer, name.into(), options);

        let result = {
            let _guard = cx.clone().attach();
            body(&cx)
        };

        if let Err(err) = &result {
            cx.span().set_status(Status::error(err.to_string()));
        }
        cx.span().end();
        result
    }
}

fn start_span(tracer: &BoxedTracer, name: Cow<'static, str>, options: SpanOptions) -> Context {
    let parent = options.parent.unwrap_or_else(Context::current);
    let mut builder = tracer.span_builder(name).with_kind(options.kind);
    if !options.attributes.is_empty() {
        builder = builder.with_attributes(options.attributes);
    }
    let span = builder.start_with_context(tracer, &parent);
    parent.with_span(span)
}

/// Set a batch of attributes on the span carried by `cx`.
///
/// A context without an active span accepts and discards the attributes, so
/// callers need no tracer-presence check of their own.
pub fn set_span_attributes<I>(cx: &Context, attributes: I)
where
    I: IntoIterator<Item = KeyValue>,
{
    cx.span().set_attributes(attributes);
}
