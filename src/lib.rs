//! # CEP relay
//! Accepts `POST /cep` with `{"cep": "<8 digits>"}`, validates the code,
//! forwards it to the weather service and relays the weather service's JSON
//! document back unchanged.
//!
//! ## Setup
//! Tracing and logging are set up using [`setup::setup`]. This should be the
//! first call of the server binary. It returns a [`setup::Telemetry`] handle
//! whose propagator is passed explicitly to the router and the
//! [`weather::WeatherClient`].
//!
//! ## Http Trace Propagation
//! [`http_injector`] injects and extracts trace context into/from
//! [`http::HeaderMap`]s. [`middleware::TraceLayer`] opens the single span each
//! request gets, parented on the caller's context; the handler passes that
//! span's context to the weather call so both services land in one trace.
//!
//! ## Errors
//! Every failure is a [`error::RelayError`] that maps to a terminal status:
//! 400 for undecodable bodies, 422 for malformed codes and 500 for anything
//! that goes wrong downstream.

pub mod cep;
pub mod config;
pub mod error;
pub mod http_injector;
pub mod middleware;
pub mod server;
pub mod setup;
pub mod weather;
