use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use clap::Parser;
use mp2md_core::{ConvertConfig, FetchConfig, ImagePolicy, Mp2mdError, extract_text, parse_from_url, render_markdown};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Serve article conversion over HTTP
#[derive(Parser, Debug)]
#[command(name = "mp2md-server", version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "MP2MD_PORT", default_value_t = 8964)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Upstream HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

struct AppState {
    fetch: FetchConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Format {
    #[default]
    Markdown,
    Text,
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    url: String,
    #[serde(default)]
    image: ImagePolicy,
    #[serde(default)]
    format: Format,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Upstream(String),
    Internal(String),
}

impl From<Mp2mdError> for ApiError {
    fn from(err: Mp2mdError) -> Self {
        match err {
            Mp2mdError::InvalidUrl(_) | Mp2mdError::InvalidImagePolicy(_) => ApiError::BadRequest(err.to_string()),
            Mp2mdError::HttpError(_) | Mp2mdError::Timeout { .. } => ApiError::Upstream(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        tracing::warn!(status = %status, "request failed: {}", message);
        (status, message).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn convert(State(state): State<Arc<AppState>>, Query(query): Query<ConvertQuery>) -> Result<Response, ApiError> {
    if query.image == ImagePolicy::Save {
        return Err(ApiError::BadRequest(
            "image policy 'save' needs an output directory; use url or base64".to_string(),
        ));
    }

    // Text output drops images, so there is nothing to load.
    let image_policy = if query.format == Format::Text { ImagePolicy::Url } else { query.image };
    let config = ConvertConfig { image_policy, fetch: state.fetch.clone() };

    tracing::info!(url = %query.url, image = %image_policy, format = ?query.format, "converting");
    let article = parse_from_url(&query.url, &config).await?;

    let response = match query.format {
        Format::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            render_markdown(&article).markdown,
        ),
        Format::Text => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], extract_text(&article)),
    };

    Ok(response.into_response())
}

fn app(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.fetch.timeout.saturating_mul(4).max(30));

    Router::new()
        .route("/health", get(health))
        .route("/convert", get(convert))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState { fetch: FetchConfig { timeout: args.timeout, ..FetchConfig::default() } });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
