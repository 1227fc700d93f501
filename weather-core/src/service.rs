use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    config::WeatherSettings,
    model::{ProviderResponse, QueryDraft, QueryParameters, Setting},
    transport::{HttpRequest, HttpTransport, TransportError},
    validator::{ValidationError, Validator, WeatherValidator},
};

pub const API_KEY_HEADER: &str = "X-Yandex-API-Key";

pub const DEFAULT_LANG: &str = "ru_RU";
pub const DEFAULT_LIMIT: i64 = 7;
pub const DEFAULT_HOURS: bool = true;
pub const DEFAULT_EXTRA: bool = false;

/// The provider answered with a 4xx status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider rejected the request with status {status}")]
pub struct ProviderError {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider responded with unexpected status {status}")]
    Upstream { status: u16 },

    #[error("configuration value `{0}` is not set")]
    MissingSetting(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("provider returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Builds the forecast query from settings and forwards it to the provider.
#[derive(Debug)]
pub struct WeatherQueryService<V = WeatherValidator> {
    settings: WeatherSettings,
    transport: Arc<dyn HttpTransport>,
    validator: V,
}

impl<V: Validator> WeatherQueryService<V> {
    pub fn new(settings: WeatherSettings, transport: Arc<dyn HttpTransport>, validator: V) -> Self {
        Self { settings, transport, validator }
    }

    /// Raw query values with defaults filled in and `limit` clamped to at least 1.
    pub fn draft(&self) -> QueryDraft {
        let s = &self.settings;

        QueryDraft {
            lat: s.latitude.clone(),
            lon: s.longitude.clone(),
            lang: s.lang.clone().unwrap_or_else(|| Setting::from(DEFAULT_LANG)),
            limit: clamp_limit(s.limit.clone().unwrap_or(Setting::Integer(DEFAULT_LIMIT))),
            hours: s.hours.clone().unwrap_or(Setting::Bool(DEFAULT_HOURS)),
            extra: s.extra.clone().unwrap_or(Setting::Bool(DEFAULT_EXTRA)),
        }
    }

    pub fn parameters(&self) -> Result<QueryParameters, ValidationError> {
        self.validator.check(&self.draft())
    }

    /// Everything short of the network call. Validation runs before settings
    /// needed only for transport are looked at.
    pub fn build_request(&self) -> Result<HttpRequest, WeatherError> {
        let params = self.parameters()?;

        let base = self
            .settings
            .api_url
            .as_deref()
            .ok_or(WeatherError::MissingSetting("weather.api_url"))?;
        let key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(WeatherError::MissingSetting("weather.api_key"))?;

        Ok(HttpRequest {
            url: join_query(base, &params.to_query_string()),
            headers: vec![(API_KEY_HEADER.to_string(), key.to_string())],
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<ProviderResponse, WeatherError> {
        let request = self.build_request()?;
        debug!(url = %request.url, "requesting forecast");

        let response = self.transport.send(request).await?;

        match response.status {
            200..=299 => Ok(ProviderResponse::from_json(response.body)?),
            400..=499 => {
                warn!(status = response.status, "provider rejected forecast request");
                Err(ProviderError { status: response.status, body: response.body }.into())
            }
            status => Err(WeatherError::Upstream { status }),
        }
    }
}

/// Casts to an integer, then raises anything below 1 to 1.
fn clamp_limit(limit: Setting) -> Setting {
    Setting::Integer(limit.to_integer().max(1))
}

/// Appends `query` to `base` with exactly one `?`, or `&` if `base` already has a query.
pub fn join_query(base: &str, query: &str) -> String {
    if base.ends_with('?') || base.ends_with('&') {
        format!("{base}{query}")
    } else if base.contains('?') {
        format!("{base}&{query}")
    } else {
        format!("{base}?{query}")
    }
}
