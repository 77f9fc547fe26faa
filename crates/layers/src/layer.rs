use streaming::{BoxFuture, TileError, TileGeometry};

use crate::grid::ElevationGrid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;
}

/// What a host engine needs from a ground elevation source.
///
/// The host calls `load` once, reads `tile_info` to align its mesh with the
/// layer, then requests tiles concurrently. Every failure rejects the future.
pub trait ElevationLayer: Layer + Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<(), TileError>>;

    /// Tiling scheme of the elevation tiles; `None` until loaded.
    fn tile_info(&self) -> Option<&TileGeometry>;

    fn fetch_tile(
        &self,
        level: u8,
        row: u32,
        col: u32,
    ) -> BoxFuture<'_, Result<ElevationGrid, TileError>>;
}
