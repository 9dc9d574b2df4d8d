use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::{
    propagation::{Extractor, Injector, TextMapPropagator},
    Context,
};

/// Propagator handed to every component that crosses a process boundary.
pub type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// Writes `context` into outbound `headers` so the receiving service can
/// attach its spans to the same trace.
pub fn inject_context(
    propagator: &(dyn TextMapPropagator + Send + Sync),
    context: &Context,
    headers: &mut HeaderMap,
) {
    propagator.inject_context(context, &mut HeaderInjector::new(headers));
}

/// Constructs the caller's [`Context`] from inbound `headers`. Returns an
/// empty context when the caller sent none.
pub fn extract_context(
    propagator: &(dyn TextMapPropagator + Send + Sync),
    headers: &HeaderMap,
) -> Context {
    propagator.extract_with_context(&Context::new(), &HeaderExtractor::new(headers))
}

// "traceparent" => https://www.w3.org/TR/trace-context/#trace-context-http-headers-format

/// Injector used via opentelemetry propagator to insert header values. With
/// the W3C propagator this is a "traceparent" string value
/// "{version}-{trace_id}-{span_id}-{trace_flags}" of the span's context;
/// the Jaeger propagator adds "uber-trace-id" alongside it.
struct HeaderInjector<'a> {
    headers: &'a mut HeaderMap,
}

impl<'a> HeaderInjector<'a> {
    pub fn new(headers: &'a mut HeaderMap) -> Self {
        HeaderInjector { headers }
    }
}

impl<'a> Injector for HeaderInjector<'a> {
    fn set(&mut self, key: &str, value: String) {
        let Ok(key) = key.parse::<HeaderName>() else {
            tracing::debug!(%key, "failed to parse header name");
            return;
        };
        let Ok(value) = HeaderValue::from_str(&value) else {
            tracing::debug!(%value, "failed to parse header value");
            return;
        };
        self.headers.insert(key, value);
    }
}

struct HeaderExtractor<'a> {
    headers: &'a HeaderMap,
}

impl<'a> HeaderExtractor<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        HeaderExtractor { headers }
    }
}

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|h| h.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(|s| s.as_str()).collect()
    }
}
