use std::future::Future;
use std::pin::Pin;

use image::RgbaImage;

use crate::error::TileError;
use crate::geometry::TileGeometry;
use crate::tile::TileAddress;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pyramid of colour imagery tiles.
///
/// Implementations must be `Send + Sync`; callers issue many `fetch_tile`
/// calls concurrently and share the source behind an `Arc`. Methods return
/// boxed futures for dyn-compatibility.
pub trait TileImageSource: Send + Sync {
    /// The hosted tiling scheme: the advertised pyramid truncated to the
    /// levels that have data.
    fn resolve_geometry(&self) -> BoxFuture<'_, Result<TileGeometry, TileError>>;

    /// Fetch and decode one tile into RGBA pixels.
    ///
    /// Addresses outside the hosted geometry fail with
    /// [`TileError::TileUnavailable`] without touching the backend.
    fn fetch_tile(&self, address: TileAddress) -> BoxFuture<'_, Result<RgbaImage, TileError>>;
}

impl<T: TileImageSource + ?Sized> TileImageSource for std::sync::Arc<T> {
    fn resolve_geometry(&self) -> BoxFuture<'_, Result<TileGeometry, TileError>> {
        (**self).resolve_geometry()
    }

    fn fetch_tile(&self, address: TileAddress) -> BoxFuture<'_, Result<RgbaImage, TileError>> {
        (**self).fetch_tile(address)
    }
}
