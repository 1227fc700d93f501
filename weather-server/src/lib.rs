//! HTTP surface of the weather proxy.
//!
//! Exposes `GET /api/weather`, which runs [`weather_core::WeatherQueryService`]
//! and wraps the outcome in a JSON envelope.

pub mod handler;

pub use handler::{Envelope, Reply, RequestHandler, WEATHER_ROUTE, router};
