//! Shared utilities for the relay integration tests.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use cep_relay::{
    server::{self, AppState, OPERATION},
    setup,
    weather::WeatherClient,
};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{
    export::trace::SpanData, testing::trace::InMemorySpanExporter, trace::TracerProvider,
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{layer::SubscriberExt, Registry};
use url::Url;

/// Fake tracing collaborator: every span that ends lands in an in-memory
/// exporter. Installed as the default subscriber for the current thread, so
/// tests must run on a current-thread runtime.
pub struct TestTracing {
    exporter: InMemorySpanExporter,
    provider: TracerProvider,
    _guard: DefaultGuard,
}

impl TestTracing {
    pub fn init() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = provider.tracer("cep-relay-test");

        let subscriber =
            Registry::default().with(tracing_opentelemetry::layer().with_tracer(tracer));
        let guard = tracing::subscriber::set_default(subscriber);

        Self {
            exporter,
            provider,
            _guard: guard,
        }
    }

    /// Spans opened by the relay's trace layer that have been closed.
    pub fn request_spans(&self) -> Vec<SpanData> {
        let _ = self.provider.force_flush();
        self.exporter
            .get_finished_spans()
            .unwrap()
            .into_iter()
            .filter(|span| span.name == OPERATION)
            .collect()
    }
}

/// What the mock weather service saw on one call.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub cep: Option<String>,
    pub traceparent: Option<String>,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct MockWeather {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockWeather {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start a mock weather service that answers every `GET /weather` with a
/// fixed status and body.
pub async fn start_mock_weather(status: StatusCode, body: &'static str) -> MockWeather {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/weather", get(weather))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockWeather { addr, seen }
}

async fn weather(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.seen.lock().unwrap().push(SeenRequest {
        cep: query.get("cep").cloned(),
        traceparent: headers
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn relay(weather_url: &str) -> Router {
    relay_with_limit(weather_url, 64 * 1024)
}

pub fn relay_with_limit(weather_url: &str, max_body_bytes: usize) -> Router {
    let propagator = setup::propagator();
    let weather = WeatherClient::new(
        Url::parse(weather_url).unwrap(),
        Some(Duration::from_secs(5)),
        propagator.clone(),
    )
    .unwrap();
    server::router(AppState::new(weather), propagator, max_body_bytes)
}

pub struct Relayed {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Relayed {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn post_cep(app: Router, body: &str) -> Relayed {
    post_cep_with_headers(app, body, HeaderMap::new()).await
}

pub async fn post_cep_with_headers(app: Router, body: &str, headers: HeaderMap) -> Relayed {
    let mut request = Request::post("/cep")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    request.headers_mut().extend(headers);

    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    Relayed {
        status,
        headers,
        body,
    }
}
