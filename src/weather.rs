//! Client for the downstream weather service.

use std::time::Duration;

use http::StatusCode;
use opentelemetry::Context;
use serde_json::{Map, Value};
use url::Url;

use crate::{
    cep::Cep,
    error::RelayError,
    http_injector::{self, SharedPropagator},
};

/// The weather service's answer, relayed without inspection.
pub type WeatherDocument = Map<String, Value>;

#[derive(Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: Url,
    propagator: SharedPropagator,
}

impl WeatherClient {
    pub fn new(
        base_url: Url,
        timeout: Option<Duration>,
        propagator: SharedPropagator,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            propagator,
        })
    }

    /// `{base}/weather?cep={cep}`
    pub fn weather_url(&self, cep: &Cep) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/weather");
        url.query_pairs_mut().clear().append_pair("cep", cep.as_str());
        url
    }

    /// Fetches the weather document for `cep`, carrying `context` to the
    /// weather service in the propagation headers.
    ///
    /// Only a `200 OK` with a JSON object body succeeds. Dropping the returned
    /// future aborts the outbound call.
    pub async fn fetch(&self, context: &Context, cep: &Cep) -> Result<WeatherDocument, RelayError> {
        let mut request = self
            .client
            .get(self.weather_url(cep))
            .build()
            .map_err(RelayError::DownstreamUnreachable)?;
        http_injector::inject_context(self.propagator.as_ref(), context, request.headers_mut());

        tracing::debug!(url = %request.url(), "calling weather service");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(RelayError::DownstreamUnreachable)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RelayError::DownstreamStatus(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(RelayError::DownstreamUnreachable)?;
        serde_json::from_slice(&body).map_err(RelayError::DownstreamDecode)
    }
}
