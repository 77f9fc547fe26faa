use image::RgbaImage;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::TileSourceConfig;
use crate::decode::decode_tile_image;
use crate::error::TileError;
use crate::geometry::TileGeometry;
use crate::source::{BoxFuture, TileImageSource};
use crate::tile::TileAddress;

/// Imagery tiles from a remote `{level}/{row}/{col}` URL template.
pub struct HttpTileSource {
    config: TileSourceConfig,
    client: reqwest::Client,
    geometry: OnceCell<TileGeometry>,
}

impl HttpTileSource {
    pub fn new(config: TileSourceConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            geometry: OnceCell::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &TileSourceConfig {
        &self.config
    }

    pub fn tile_url(&self, address: TileAddress) -> String {
        self.config
            .url_template
            .replace("{level}", &address.level.to_string())
            .replace("{row}", &address.row.to_string())
            .replace("{col}", &address.col.to_string())
    }

    /// Truncation happens once per source; later callers share the result.
    async fn geometry(&self) -> Result<&TileGeometry, TileError> {
        self.geometry
            .get_or_try_init(|| async {
                let geometry = self.config.resolve_geometry()?;
                info!(
                    min_level = ?geometry.min_level(),
                    max_level = ?geometry.max_level(),
                    "resolved imagery tiling scheme"
                );
                Ok::<_, TileError>(geometry)
            })
            .await
    }
}

impl TileImageSource for HttpTileSource {
    fn resolve_geometry(&self) -> BoxFuture<'_, Result<TileGeometry, TileError>> {
        Box::pin(async move { Ok(self.geometry().await?.clone()) })
    }

    fn fetch_tile(&self, address: TileAddress) -> BoxFuture<'_, Result<RgbaImage, TileError>> {
        Box::pin(async move {
            self.geometry().await?.check(address)?;

            let url = self.tile_url(address);
            debug!(%address, %url, "fetching imagery tile");

            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| TileError::network_with_source("HTTP request failed", e))?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(TileError::not_found(address));
            }

            if !resp.status().is_success() {
                warn!(%address, status = %resp.status(), "imagery tile request failed");
                return Err(TileError::network(format!("HTTP error: {}", resp.status())));
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| TileError::network_with_source("Failed to read response", e))?;

            decode_tile_image(&bytes)
        })
    }
}
