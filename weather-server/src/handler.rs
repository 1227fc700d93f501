use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;
use weather_core::{ProviderError, ProviderResponse, WeatherError, WeatherQueryService};

pub const WEATHER_ROUTE: &str = "/api/weather";

pub const INVALID_DATA_MESSAGE: &str = "The given data was invalid.";
pub const SERVER_ERROR_MESSAGE: &str = "Server Error";

/// JSON body returned to API callers.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Data {
        data: ProviderResponse,
    },
    Invalid {
        message: &'static str,
        errors: BTreeMap<String, Vec<String>>,
    },
    Message {
        message: String,
    },
}

/// Status plus envelope; what the endpoint (and `weather fetch`) emits.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl From<Result<ProviderResponse, WeatherError>> for Reply {
    fn from(result: Result<ProviderResponse, WeatherError>) -> Self {
        match result {
            Ok(data) => Reply {
                status: StatusCode::OK,
                envelope: Envelope::Data { data },
            },
            Err(WeatherError::Validation(e)) => Reply {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                envelope: Envelope::Invalid {
                    message: INVALID_DATA_MESSAGE,
                    errors: e.errors().clone(),
                },
            },
            Err(WeatherError::Provider(e)) => Reply {
                status: StatusCode::from_u16(e.status).unwrap_or(StatusCode::BAD_GATEWAY),
                envelope: Envelope::Message {
                    message: provider_message(&e),
                },
            },
            Err(other) => {
                error!(error = %other, "weather request failed");
                Reply {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    envelope: Envelope::Message {
                        message: SERVER_ERROR_MESSAGE.to_string(),
                    },
                }
            }
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// The provider's own `message` if its error body has a string one,
/// otherwise the error's description.
pub fn provider_message(err: &ProviderError) -> String {
    serde_json::from_str::<serde_json::Value>(&err.body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| err.to_string())
}

/// Entry point of the weather endpoint.
#[derive(Debug)]
pub struct RequestHandler {
    service: WeatherQueryService,
}

impl RequestHandler {
    pub fn new(service: WeatherQueryService) -> Self {
        Self { service }
    }

    pub async fn get(&self) -> Reply {
        Reply::from(self.service.get().await)
    }
}

pub fn router(handler: RequestHandler) -> Router {
    Router::new()
        .route(WEATHER_ROUTE, get(get_weather))
        .with_state(Arc::new(handler))
        .layer(TraceLayer::new_for_http())
}

async fn get_weather(State(handler): State<Arc<RequestHandler>>) -> Reply {
    handler.get().await
}
