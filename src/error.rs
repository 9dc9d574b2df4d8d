use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

/// Every way a single `POST /cep` request can end early.
///
/// Each variant is terminal for its request. The client only ever sees the
/// status and a short message; the wrapped detail is kept for logs and the
/// request span.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("error decoding request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid zipcode")]
    InvalidFormat,

    #[error("weather service unreachable: {0}")]
    DownstreamUnreachable(#[source] reqwest::Error),

    #[error("weather service returned status {0}")]
    DownstreamStatus(StatusCode),

    #[error("weather service returned an invalid document: {0}")]
    DownstreamDecode(#[source] serde_json::Error),

    #[error("error encoding response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Decode(_) => StatusCode::BAD_REQUEST,
            RelayError::InvalidFormat => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::DownstreamUnreachable(_)
            | RelayError::DownstreamStatus(_)
            | RelayError::DownstreamDecode(_)
            | RelayError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message written to the response body.
    pub fn client_message(&self) -> &'static str {
        match self {
            RelayError::Decode(_) => "error decoding request",
            RelayError::InvalidFormat => "invalid zipcode",
            RelayError::DownstreamUnreachable(_)
            | RelayError::DownstreamStatus(_)
            | RelayError::DownstreamDecode(_) => "weather service error",
            RelayError::Encode(_) => "error encoding response",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.client_message()).into_response()
    }
}

/// Failures while installing the tracing provider and subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build span exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid url: {source}")]
    Url {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{name} is not a valid socket address: {source}")]
    Addr {
        name: &'static str,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("{name} is not a number: {source}")]
    Number {
        name: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{\"cep\": }").unwrap_err()
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(RelayError::Decode(decode_error()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::InvalidFormat.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            RelayError::DownstreamStatus(StatusCode::SERVICE_UNAVAILABLE).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::DownstreamDecode(decode_error()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn downstream_detail_stays_out_of_the_body() {
        let err = RelayError::DownstreamStatus(StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("503"));
        assert_eq!(err.client_message(), "weather service error");
    }
}
