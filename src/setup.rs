use std::sync::Arc;

use opentelemetry::{
    global,
    propagation::TextMapCompositePropagator,
    trace::{TraceError, TracerProvider as _},
    KeyValue,
};
use opentelemetry_otlp::{SpanExporterBuilder, WithExportConfig};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime,
    trace::{self, TracerProvider},
    Resource,
};
use tracing_core::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::{config::Config, error::TelemetryError, http_injector::SharedPropagator};

/// Handle to the process-wide tracing provider.
///
/// Built once by [`setup`] before the listener binds and read-only afterwards.
/// The propagator is handed to the request path explicitly instead of being
/// looked up globally.
pub struct Telemetry {
    provider: TracerProvider,
    propagator: SharedPropagator,
}

impl Telemetry {
    pub fn propagator(&self) -> SharedPropagator {
        self.propagator.clone()
    }

    /// Flushes spans still sitting in the batch processors.
    pub fn shutdown(self) {
        for result in self.provider.force_flush() {
            if let Err(err) = result {
                tracing::warn!(error = %err, "failed to flush spans");
            }
        }
        global::shutdown_tracer_provider();
    }
}

/// Propagates W3C trace context, plus Jaeger's `uber-trace-id` for older
/// services in the same trace.
pub fn propagator() -> SharedPropagator {
    Arc::new(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(opentelemetry_jaeger_propagator::Propagator::new()),
    ]))
}

/// Sets up tracing and logging. Spans are batched to both the OTLP collector
/// and Zipkin, tagged with `service.name` from the config. Logs go to stdout,
/// filtered by `RUST_LOG` (default `info`).
///
/// This should generally be the first statement of the server binary's main
/// function, and must run inside a Tokio runtime.
pub fn setup(config: &Config) -> Result<Telemetry, TelemetryError> {
    let provider = init_provider(config)?;
    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(config.service_name.clone());
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy()
        }))
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        otlp = %config.otlp_endpoint,
        zipkin = %config.zipkin_endpoint,
        "tracing initialized"
    );

    Ok(Telemetry {
        provider,
        propagator: propagator(),
    })
}

fn init_provider(config: &Config) -> Result<TracerProvider, TraceError> {
    let otlp = SpanExporterBuilder::from(
        opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(config.otlp_endpoint.clone()),
    )
    .build_span_exporter()?;

    let zipkin = opentelemetry_zipkin::new_pipeline()
        .with_service_name(config.service_name.clone())
        .with_collector_endpoint(config.zipkin_endpoint.clone())
        .init_exporter()?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(otlp, runtime::Tokio)
        .with_batch_exporter(zipkin, runtime::Tokio)
        .with_config(trace::config().with_resource(Resource::new(vec![KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            config.service_name.clone(),
        )])))
        .build())
}
