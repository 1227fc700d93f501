//! Core library for the weather proxy.
//!
//! This crate defines:
//! - Configuration (TOML file plus `WEATHER_*` environment overrides)
//! - Validation of the configured forecast parameters
//! - Query construction and the call to the Yandex Weather provider
//!
//! It is used by `weather-server`, which exposes the result over HTTP.

pub mod config;
pub mod model;
pub mod service;
pub mod transport;
pub mod validator;

pub use config::{Config, ServerSettings, WeatherSettings};
pub use model::{ProviderResponse, QueryDraft, QueryParameters, Setting};
pub use service::{ProviderError, WeatherError, WeatherQueryService};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use validator::{ValidationError, Validator, WeatherValidator};
