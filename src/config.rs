//! Process configuration.
//!
//! Everything is read from the environment once at startup. Missing variables
//! fall back to the defaults of the compose deployment; malformed ones abort
//! startup.

use std::{env, net::SocketAddr, time::Duration};

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_WEATHER_SERVICE_URL: &str = "http://service-b:8081";
pub const DEFAULT_SERVICE_NAME: &str = "service-a";
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://otel-collector:4317";
pub const DEFAULT_ZIPKIN_ENDPOINT: &str = "http://zipkin:9411/api/v2/spans";
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the inbound listener binds to.
    pub listen_addr: SocketAddr,

    /// Base URL of the weather service; `/weather?cep=` is appended per call.
    pub weather_service_url: Url,

    /// Value of the `service.name` resource attribute on exported spans.
    pub service_name: String,

    /// OTLP gRPC collector endpoint.
    pub otlp_endpoint: String,

    /// Zipkin v2 span collector endpoint.
    pub zipkin_endpoint: String,

    /// Outbound timeout. `None` keeps the transport default (no timeout).
    pub weather_timeout: Option<Duration>,

    /// Upper bound on the inbound request body.
    pub max_body_bytes: usize,
}

impl Config {
    /// Reads `LISTEN_ADDR`, `WEATHER_SERVICE_URL`, `SERVICE_NAME`,
    /// `OTEL_EXPORTER_OTLP_ENDPOINT`, `ZIPKIN_ENDPOINT`,
    /// `WEATHER_TIMEOUT_SECS` and `MAX_BODY_BYTES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = lookup("LISTEN_ADDR").unwrap_or(DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::Addr { name: "LISTEN_ADDR", source })?;

        let weather_service_url =
            lookup("WEATHER_SERVICE_URL").unwrap_or(DEFAULT_WEATHER_SERVICE_URL.to_string());
        let weather_service_url = Url::parse(&weather_service_url)
            .map_err(|source| ConfigError::Url { name: "WEATHER_SERVICE_URL", source })?;

        let weather_timeout = lookup("WEATHER_TIMEOUT_SECS")
            .map(|secs| secs.parse::<u64>())
            .transpose()
            .map_err(|source| ConfigError::Number { name: "WEATHER_TIMEOUT_SECS", source })?
            .map(Duration::from_secs);

        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .map(|bytes| bytes.parse::<usize>())
            .transpose()
            .map_err(|source| ConfigError::Number { name: "MAX_BODY_BYTES", source })?
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Ok(Self {
            listen_addr,
            weather_service_url,
            service_name: lookup("SERVICE_NAME").unwrap_or(DEFAULT_SERVICE_NAME.to_string()),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(DEFAULT_OTLP_ENDPOINT.to_string()),
            zipkin_endpoint: lookup("ZIPKIN_ENDPOINT")
                .unwrap_or(DEFAULT_ZIPKIN_ENDPOINT.to_string()),
            weather_timeout,
            max_body_bytes,
        })
    }
}
