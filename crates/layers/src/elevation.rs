//! Synthetic ground elevation derived from imagery brightness.
//!
//! Each imagery pixel becomes one elevation sample: its relative luminance
//! scaled by a fixed exaggeration factor. The elevation tiles reuse the
//! imagery's tiling scheme unchanged, so the relief lines up pixel for pixel
//! with the same imagery draped on top.

use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use streaming::{BoxFuture, TileAddress, TileError, TileGeometry, TileImageSource};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::grid::ElevationGrid;
use crate::layer::{ElevationLayer, Layer, LayerId};
use crate::luminance::relative_luminance;

/// Metres of relief at full brightness in the reference deployment.
/// A luminance of 0.75 becomes 63,750 m.
pub const DEFAULT_EXAGGERATION_FACTOR: f64 = 85_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationConfig {
    pub layer_id: u64,
    pub exaggeration_factor: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            layer_id: 0,
            exaggeration_factor: DEFAULT_EXAGGERATION_FACTOR,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// Tracks one in-flight `load`; released on completion or when the future is
/// dropped.
struct LoadGuard<'a>(&'a AtomicUsize);

impl<'a> LoadGuard<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Elevation layer backed by an imagery tile source.
///
/// The geometry cell is written once by `load` and only read afterwards, so
/// concurrent `fetch` calls share nothing mutable.
pub struct LuminanceElevationProvider<S> {
    id: LayerId,
    source: S,
    exaggeration_factor: f64,
    geometry: OnceCell<TileGeometry>,
    loads_in_flight: AtomicUsize,
}

impl<S: TileImageSource> LuminanceElevationProvider<S> {
    pub fn new(source: S, config: &ElevationConfig) -> Result<Self, TileError> {
        let factor = config.exaggeration_factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(TileError::InvalidGeometry(format!(
                "exaggeration factor must be finite and non-negative, got {factor}"
            )));
        }

        Ok(Self {
            id: LayerId(config.layer_id),
            source,
            exaggeration_factor: factor,
            geometry: OnceCell::new(),
            loads_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn exaggeration_factor(&self) -> f64 {
        self.exaggeration_factor
    }

    pub fn state(&self) -> LoadState {
        if self.geometry.initialized() {
            LoadState::Loaded
        } else if self.loads_in_flight.load(Ordering::SeqCst) > 0 {
            LoadState::Loading
        } else {
            LoadState::Unloaded
        }
    }

    pub fn geometry(&self) -> Option<&TileGeometry> {
        self.geometry.get()
    }

    /// Adopt the source's tiling scheme.
    ///
    /// Concurrent callers share one resolution. On failure the provider stays
    /// unloaded and a later call retries.
    pub async fn load(&self) -> Result<&TileGeometry, TileError> {
        if let Some(geometry) = self.geometry.get() {
            return Ok(geometry);
        }

        let _guard = LoadGuard::enter(&self.loads_in_flight);
        let result = self
            .geometry
            .get_or_try_init(|| async {
                let geometry = self.source.resolve_geometry().await?;
                info!(
                    layer = self.id.0,
                    levels = geometry.lods().len(),
                    tile_size = geometry.tile_size,
                    "adopted imagery tiling scheme"
                );
                Ok::<_, TileError>(geometry)
            })
            .await;

        if let Err(err) = &result {
            warn!(layer = self.id.0, "elevation layer failed to load: {err}");
        }
        result
    }

    /// Elevation samples for one tile.
    pub async fn fetch(&self, address: TileAddress) -> Result<ElevationGrid, TileError> {
        let geometry = self.geometry.get().ok_or(TileError::GeometryNotReady)?;
        geometry.check(address)?;

        let image = self.source.fetch_tile(address).await?;
        let grid = elevation_from_image(&image, self.exaggeration_factor);
        debug!(%address, width = grid.width, height = grid.height, "built elevation tile");
        Ok(grid)
    }
}

/// Convert every pixel, row-major, to `luminance * exaggeration_factor`.
///
/// Alpha is read past and ignored.
pub fn elevation_from_image(image: &RgbaImage, exaggeration_factor: f64) -> ElevationGrid {
    let (width, height) = image.dimensions();
    let values = image
        .as_raw()
        .chunks_exact(4)
        .map(|px| relative_luminance(px[0], px[1], px[2]) * exaggeration_factor)
        .collect();
    ElevationGrid::new(values, width, height)
}

impl<S: TileImageSource> Layer for LuminanceElevationProvider<S> {
    fn id(&self) -> LayerId {
        self.id
    }
}

impl<S: TileImageSource> ElevationLayer for LuminanceElevationProvider<S> {
    fn load(&self) -> BoxFuture<'_, Result<(), TileError>> {
        Box::pin(async move { LuminanceElevationProvider::load(self).await.map(|_| ()) })
    }

    fn tile_info(&self) -> Option<&TileGeometry> {
        self.geometry()
    }

    fn fetch_tile(
        &self,
        level: u8,
        row: u32,
        col: u32,
    ) -> BoxFuture<'_, Result<ElevationGrid, TileError>> {
        Box::pin(async move { self.fetch(TileAddress::new(level, row, col)).await })
    }
}
