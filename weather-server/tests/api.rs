use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use weather_core::{
    HttpRequest, HttpResponse, HttpTransport, Setting, TransportError, WeatherQueryService,
    WeatherSettings, WeatherValidator,
};
use weather_server::{RequestHandler, WEATHER_ROUTE, router};

#[derive(Debug)]
struct StubProvider {
    status: u16,
    body: String,
    calls: Mutex<usize>,
}

#[async_trait]
impl HttpTransport for StubProvider {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        *self.calls.lock().unwrap() += 1;
        Ok(HttpResponse { status: self.status, body: self.body.clone() })
    }
}

fn stub(status: u16, body: &str) -> Arc<StubProvider> {
    Arc::new(StubProvider { status, body: body.to_string(), calls: Mutex::new(0) })
}

fn settings() -> WeatherSettings {
    WeatherSettings {
        api_url: Some("https://api.weather.yandex.ru/v2/forecast".into()),
        api_key: Some("KEY".into()),
        latitude: Some(Setting::Float(55.75)),
        longitude: Some(Setting::Float(37.62)),
        ..Default::default()
    }
}

async fn call(settings: WeatherSettings, provider: Arc<StubProvider>) -> (StatusCode, String) {
    let service = WeatherQueryService::new(settings, provider, WeatherValidator);
    let app = router(RequestHandler::new(service));

    let resp = app
        .oneshot(Request::builder().uri(WEATHER_ROUTE).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn success_wraps_provider_json_in_data() {
    let payload = r#"{"now":1700000000,"fact":{"temp":-3,"feels_like":-8.50},"forecasts":[]}"#;

    let (status, body) = call(settings(), stub(200, payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!(r#"{{"data":{payload}}}"#));
}

#[tokio::test]
async fn provider_client_error_returns_its_message_and_status() {
    let (status, body) = call(settings(), stub(400, r#"{"message":"invalid key"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"invalid key"}"#);
}

#[tokio::test]
async fn provider_client_error_without_message_uses_generic_text() {
    let (status, body) = call(settings(), stub(403, "Forbidden")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"message":"provider rejected the request with status 403"}"#);
}

#[tokio::test]
async fn invalid_settings_return_field_errors_without_calling_provider() {
    let provider = stub(200, "{}");
    let settings = WeatherSettings {
        latitude: Some(Setting::from("north")),
        lang: Some(Setting::from("russian")),
        ..settings()
    };

    let (status, body) = call(settings, provider.clone()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "The given data was invalid.");
    assert_eq!(json["errors"]["lat"][0], "The lat must be a number.");
    assert_eq!(json["errors"]["lang"][0], "The lang format is invalid.");
    assert_eq!(*provider.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn provider_server_error_is_a_generic_failure() {
    let (status, body) = call(settings(), stub(500, "oops")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"message":"Server Error"}"#);
}

#[tokio::test]
async fn other_routes_are_not_found() {
    let service = WeatherQueryService::new(settings(), stub(200, "{}"), WeatherValidator);
    let app = router(RequestHandler::new(service));

    let resp = app
        .oneshot(Request::builder().uri("/api/other").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
