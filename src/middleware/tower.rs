use std::task::{Context, Poll};

use http::Request;
use tower::Service;
use tower_layer::Layer;
use tracing::{field::Empty, instrument::Instrumented};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::http_injector::{self, SharedPropagator};

/// Opens one server span per request, named `operation`, and runs the inner
/// service inside it.
///
/// The caller's trace context is extracted from the request headers and used
/// as the span's parent. The span closes when the inner future finishes or is
/// dropped, so every exit path of the handler ends it. Handlers fill the empty
/// `http.response.status_code`, `otel.status_code` and `otel.status_message`
/// fields through [`tracing::Span::current`].
///
/// ```ignore
/// let app = Router::new().route(
///     "/cep",
///     post(handle_cep).layer(TraceLayer::new("handle_cep", propagator)),
/// );
/// ```
#[derive(Clone)]
pub struct TraceLayer {
    operation: &'static str,
    propagator: SharedPropagator,
}

impl TraceLayer {
    pub fn new(operation: &'static str, propagator: SharedPropagator) -> Self {
        Self {
            operation,
            propagator,
        }
    }
}

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, service: S) -> Self::Service {
        TraceService {
            service,
            operation: self.operation,
            propagator: self.propagator.clone(),
        }
    }
}

/// This service implements the Trace behavior
#[derive(Clone)]
pub struct TraceService<S> {
    service: S,
    operation: &'static str,
    propagator: SharedPropagator,
}

impl<S, Body> Service<Request<Body>> for TraceService<S>
where
    S: Service<Request<Body>>,
{
    type Error = S::Error;
    type Future = Instrumented<S::Future>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let parent = http_injector::extract_context(self.propagator.as_ref(), request.headers());

        let span = tracing::info_span!(
            "request",
            otel.name = self.operation,
            otel.kind = "server",
            http.request.method = %request.method(),
            url.path = %request.uri().path(),
            http.response.status_code = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );
        span.set_parent(parent);

        tracing::Instrument::instrument(self.service.call(request), span)
    }
}
