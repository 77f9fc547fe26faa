use crate::tile::TileAddress;

/// Why a tile address cannot be served.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// Level not hosted, or row/col outside the level's grid.
    OutOfRange,
    /// The backend answered 404 (or the tile is missing from memory).
    NotFound,
}

/// Errors raised while resolving tiling geometry or fetching tiles.
///
/// None of these are retried here; the caller owns any retry policy.
#[derive(Debug)]
pub enum TileError {
    TileUnavailable {
        address: TileAddress,
        reason: Unavailable,
    },
    /// Transport failure, non-success status, or an undecodable body.
    NetworkFetch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// A tile was requested before the layer finished loading.
    GeometryNotReady,
    InvalidGeometry(String),
}

impl TileError {
    pub fn out_of_range(address: TileAddress) -> Self {
        TileError::TileUnavailable {
            address,
            reason: Unavailable::OutOfRange,
        }
    }

    pub fn not_found(address: TileAddress) -> Self {
        TileError::TileUnavailable {
            address,
            reason: Unavailable::NotFound,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        TileError::NetworkFetch {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        TileError::NetworkFetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, TileError::TileUnavailable { .. })
    }
}

impl std::fmt::Display for TileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileError::TileUnavailable { address, reason } => match reason {
                Unavailable::OutOfRange => write!(f, "tile {address} is outside the hosted range"),
                Unavailable::NotFound => write!(f, "tile {address} not found"),
            },
            TileError::NetworkFetch { message, source } => match source {
                Some(source) => write!(f, "{message}: {source}"),
                None => write!(f, "{message}"),
            },
            TileError::GeometryNotReady => write!(f, "tiling geometry not loaded yet"),
            TileError::InvalidGeometry(message) => write!(f, "invalid tiling geometry: {message}"),
        }
    }
}

impl std::error::Error for TileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TileError::NetworkFetch {
                source: Some(source),
                ..
            } => Some(source.as_ref() as _),
            _ => None,
        }
    }
}
