use serde::{Deserialize, Serialize};

/// Address of one tile in a quad-tree pyramid, in the `{level}/{row}/{col}`
/// order used by the imagery service.
///
/// Rows count down from the top edge of the tiling origin, columns count
/// right. An address is only meaningful against a [`crate::TileGeometry`]
/// that hosts its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    pub level: u8,
    pub row: u32,
    pub col: u32,
}

impl TileAddress {
    pub fn new(level: u8, row: u32, col: u32) -> Self {
        Self { level, row, col }
    }

    /// Number of tiles along one axis at `level` (2^level).
    ///
    /// Returns `None` for levels too deep to index with `u32`.
    pub fn tiles_per_axis(level: u8) -> Option<u32> {
        1u32.checked_shl(level as u32)
    }

    /// Whether row and column fall inside the level's square grid.
    pub fn in_grid(&self) -> bool {
        match Self::tiles_per_axis(self.level) {
            Some(n) => self.row < n && self.col < n,
            None => false,
        }
    }
}

impl std::fmt::Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.row, self.col)
    }
}
