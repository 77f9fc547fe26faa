use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use layers::{ElevationConfig, LuminanceElevationProvider};
use streaming::{HttpTileSource, TileAddress, TileError, TileSourceConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Provider = LuminanceElevationProvider<HttpTileSource>;

#[derive(Clone)]
struct AppState {
    provider: Arc<Provider>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env_or("ELEVATION_ADDR", "127.0.0.1:9100".parse()?)?;
    let source_config = source_config_from_env()?;
    let elevation_config = ElevationConfig {
        exaggeration_factor: env_or(
            "EXAGGERATION_FACTOR",
            ElevationConfig::default().exaggeration_factor,
        )?,
        ..ElevationConfig::default()
    };

    let provider = LuminanceElevationProvider::new(
        HttpTileSource::new(source_config),
        &elevation_config,
    )?;
    provider.load().await?;

    let state = AppState {
        provider: Arc::new(provider),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/elevation/tileinfo", get(get_tile_info))
        .route("/elevation/tiles/:level/:row/:col", get(get_elevation_tile))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("elevation server listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

fn env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| format!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn source_config_from_env() -> Result<TileSourceConfig, String> {
    let defaults = TileSourceConfig::default();
    Ok(TileSourceConfig {
        url_template: env::var("TILE_URL_TEMPLATE").unwrap_or(defaults.url_template),
        min_level: env_or("MIN_LEVEL", defaults.min_level)?,
        max_level: env_or("MAX_LEVEL", defaults.max_level)?,
        ..TileSourceConfig::default()
    })
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_tile_info(State(state): State<AppState>) -> Response {
    match state.provider.geometry() {
        Some(geometry) => Json(geometry.clone()).into_response(),
        None => error_response(&TileError::GeometryNotReady),
    }
}

async fn get_elevation_tile(
    State(state): State<AppState>,
    AxumPath((level, row, col)): AxumPath<(u32, u32, u32)>,
) -> Response {
    let address = match tile_address(level, row, col) {
        Ok(address) => address,
        Err(err) => return error_response(&err),
    };
    match state.provider.fetch(address).await {
        Ok(grid) => Json(grid).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Levels past `u8::MAX` are outside any pyramid, so they share the
/// out-of-range answer instead of a path rejection.
fn tile_address(level: u32, row: u32, col: u32) -> Result<TileAddress, TileError> {
    match u8::try_from(level) {
        Ok(level) => Ok(TileAddress::new(level, row, col)),
        Err(_) => Err(TileError::out_of_range(TileAddress::new(u8::MAX, row, col))),
    }
}

fn status_for(err: &TileError) -> StatusCode {
    match err {
        TileError::TileUnavailable { .. } => StatusCode::NOT_FOUND,
        TileError::GeometryNotReady => StatusCode::SERVICE_UNAVAILABLE,
        TileError::NetworkFetch { .. } => StatusCode::BAD_GATEWAY,
        TileError::InvalidGeometry(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &TileError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        error!("elevation tile failed: {err}");
    } else {
        warn!("elevation tile unavailable: {err}");
    }
    (status, err.to_string()).into_response()
}
