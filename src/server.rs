//! HTTP wiring for the relay: the `POST /cep` handler, its router and the
//! serve loop.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::{
    cep::{Cep, CepRequest},
    error::RelayError,
    http_injector::SharedPropagator,
    middleware::TraceLayer,
    weather::WeatherClient,
};

/// Name of the span opened for every `POST /cep` request.
pub const OPERATION: &str = "handle_cep";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherClient,
}

impl AppState {
    pub fn new(weather: WeatherClient) -> Self {
        Self { weather }
    }
}

pub fn router(state: AppState, propagator: SharedPropagator, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/cep",
            post(handle_cep).layer(TraceLayer::new(OPERATION, propagator)),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Decode, validate, forward, encode. Each step ends the request on failure;
/// the outcome is recorded on the request span either way.
pub async fn handle_cep(State(state): State<AppState>, body: Bytes) -> Response {
    let span = Span::current();

    match relay(&state, &span, &body).await {
        Ok(body) => {
            span.record("http.response.status_code", StatusCode::OK.as_u16());
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(err) => {
            let status = err.status();
            span.record("http.response.status_code", status.as_u16());
            if status.is_server_error() {
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", tracing::field::display(&err));
                tracing::error!(error = %err, "relay failed");
            } else {
                tracing::info!(error = %err, "rejected request");
            }
            err.into_response()
        }
    }
}

async fn relay(state: &AppState, span: &Span, body: &[u8]) -> Result<Vec<u8>, RelayError> {
    let request = CepRequest::decode(body)?;
    let cep = Cep::parse(&request.cep)?;

    let document = state.weather.fetch(&span.context(), &cep).await?;

    serde_json::to_vec(&document).map_err(RelayError::Encode)
}

/// Serves `router` on `listener` until Ctrl+C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
