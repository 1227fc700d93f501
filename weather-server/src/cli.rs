use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, Text};
use tokio::net::TcpListener;
use tracing::info;
use weather_core::{Config, ReqwestTransport, Setting, WeatherQueryService, WeatherValidator};
use weather_server::{Reply, RequestHandler, WEATHER_ROUTE, router};

const DEFAULT_API_URL: &str = "https://api.weather.yandex.ru/v2/forecast";

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather API proxy")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the weather endpoint over HTTP.
    Serve {
        /// Listen address, e.g. "0.0.0.0:8080". Overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Query the provider once and print the response envelope.
    Fetch,

    /// Interactively set provider credentials and location.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Serve { bind } => serve(&path, bind).await,
            Command::Fetch => fetch(&path).await,
            Command::Configure => configure(&path),
        }
    }
}

fn load(path: &Path) -> anyhow::Result<Config> {
    let mut cfg = Config::load_from(path)?;
    cfg.apply_env_overrides();
    Ok(cfg)
}

fn handler(cfg: &Config) -> anyhow::Result<RequestHandler> {
    let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;
    let service = WeatherQueryService::new(cfg.weather.clone(), Arc::new(transport), WeatherValidator);
    Ok(RequestHandler::new(service))
}

async fn serve(path: &Path, bind: Option<String>) -> anyhow::Result<()> {
    let cfg = load(path)?;
    let addr = bind.unwrap_or_else(|| cfg.server.bind.clone());

    let app = router(handler(&cfg)?);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, route = WEATHER_ROUTE, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("Server error")
}

async fn fetch(path: &Path) -> anyhow::Result<()> {
    let cfg = load(path)?;
    let Reply { status, envelope } = handler(&cfg)?.get().await;

    println!(
        "{}",
        serde_json::to_string_pretty(&envelope).context("Failed to render response")?
    );

    if !status.is_success() {
        bail!("Weather request failed with status {status}");
    }
    Ok(())
}

fn configure(path: &Path) -> anyhow::Result<()> {
    let mut cfg = Config::load_from(path)?;
    let w = &mut cfg.weather;

    let current_url = w.api_url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string());
    w.api_url = Some(
        Text::new("Provider API URL:")
            .with_default(&current_url)
            .prompt()?,
    );

    w.api_key = Some(
        Password::new("Provider API key:")
            .without_confirmation()
            .prompt()?,
    );

    let latitude = CustomType::<f64>::new("Latitude:")
        .with_default(w.latitude.as_ref().and_then(Setting::as_f64).unwrap_or(55.75))
        .with_error_message("Please enter a number")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Longitude:")
        .with_default(w.longitude.as_ref().and_then(Setting::as_f64).unwrap_or(37.62))
        .with_error_message("Please enter a number")
        .prompt()?;
    w.latitude = Some(Setting::Float(latitude));
    w.longitude = Some(Setting::Float(longitude));

    cfg.save_to(path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
