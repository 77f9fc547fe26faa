use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::RgbaImage;
use tokio::sync::{OnceCell, RwLock};

use crate::config::TileSourceConfig;
use crate::decode::{decode_tile_image, encode_png};
use crate::error::TileError;
use crate::geometry::TileGeometry;
use crate::source::{BoxFuture, TileImageSource};
use crate::tile::TileAddress;

/// In-memory tile source for testing or offline imagery.
///
/// Tiles are held encoded and decoded on every fetch, so callers see the same
/// decode path as with a remote service.
pub struct MemoryTileSource {
    config: TileSourceConfig,
    tiles: RwLock<HashMap<TileAddress, Vec<u8>>>,
    geometry: OnceCell<TileGeometry>,
    resolutions: AtomicUsize,
}

impl MemoryTileSource {
    pub fn new(config: TileSourceConfig) -> Self {
        Self {
            config,
            tiles: RwLock::new(HashMap::new()),
            geometry: OnceCell::new(),
            resolutions: AtomicUsize::new(0),
        }
    }

    pub async fn set_tile(&self, address: TileAddress, data: Vec<u8>) {
        self.tiles.write().await.insert(address, data);
    }

    pub async fn set_image(&self, address: TileAddress, image: &RgbaImage) -> Result<(), TileError> {
        let data = encode_png(image)?;
        self.set_tile(address, data).await;
        Ok(())
    }

    pub async fn remove_tile(&self, address: TileAddress) -> Option<Vec<u8>> {
        self.tiles.write().await.remove(&address)
    }

    /// How many times the geometry has been resolved.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    async fn geometry(&self) -> Result<&TileGeometry, TileError> {
        self.geometry
            .get_or_try_init(|| async {
                self.resolutions.fetch_add(1, Ordering::SeqCst);
                // Yield so concurrent loaders can observe the in-flight state.
                tokio::task::yield_now().await;
                self.config.resolve_geometry()
            })
            .await
    }
}

impl TileImageSource for MemoryTileSource {
    fn resolve_geometry(&self) -> BoxFuture<'_, Result<TileGeometry, TileError>> {
        Box::pin(async move { self.geometry().await.cloned() })
    }

    fn fetch_tile(&self, address: TileAddress) -> BoxFuture<'_, Result<RgbaImage, TileError>> {
        Box::pin(async move {
            self.geometry().await?.check(address)?;
            let tiles = self.tiles.read().await;
            let data = tiles
                .get(&address)
                .ok_or_else(|| TileError::not_found(address))?;
            decode_tile_image(data)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryTileSource;
    use crate::config::TileSourceConfig;
    use crate::error::{TileError, Unavailable};
    use crate::source::TileImageSource;
    use crate::tile::TileAddress;
    use image::{Rgba, RgbaImage};

    #[tokio::test]
    async fn serves_stored_tiles() {
        let source = MemoryTileSource::new(TileSourceConfig::default());
        let address = TileAddress::new(2, 1, 3);
        let tile = RgbaImage::from_pixel(4, 4, Rgba([9, 8, 7, 255]));
        source.set_image(address, &tile).await.unwrap();

        let fetched = source.fetch_tile(address).await.unwrap();
        assert_eq!(fetched, tile);

        assert!(source.remove_tile(address).await.is_some());
        let err = source.fetch_tile(address).await.unwrap_err();
        assert!(matches!(
            err,
            TileError::TileUnavailable {
                reason: Unavailable::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejects_unhosted_levels_even_when_stored() {
        let source = MemoryTileSource::new(TileSourceConfig::default());
        let address = TileAddress::new(0, 0, 0);
        source
            .set_image(address, &RgbaImage::new(1, 1))
            .await
            .unwrap();

        let err = source.fetch_tile(address).await.unwrap_err();
        assert!(matches!(
            err,
            TileError::TileUnavailable {
                reason: Unavailable::OutOfRange,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn counts_geometry_resolutions() {
        let source = MemoryTileSource::new(TileSourceConfig::default());
        assert_eq!(source.resolutions(), 0);
        source.resolve_geometry().await.unwrap();
        assert_eq!(source.resolutions(), 1);
    }

    #[tokio::test]
    async fn geometry_is_resolved_once_across_calls_and_fetches() {
        let source = MemoryTileSource::new(TileSourceConfig::default());
        let first = source.resolve_geometry().await.unwrap();
        let second = source.resolve_geometry().await.unwrap();
        assert_eq!(first, second);

        let _ = source.fetch_tile(TileAddress::new(1, 0, 0)).await;
        assert_eq!(source.resolutions(), 1);
    }

    #[tokio::test]
    async fn fetch_before_resolve_resolves_once() {
        let source = MemoryTileSource::new(TileSourceConfig::default());
        let _ = source.fetch_tile(TileAddress::new(2, 0, 0)).await;
        let _ = source.fetch_tile(TileAddress::new(2, 1, 0)).await;
        source.resolve_geometry().await.unwrap();
        assert_eq!(source.resolutions(), 1);
    }
}
