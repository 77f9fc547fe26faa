//! Tiling geometry: the level/row/col addressing scheme of an imagery
//! pyramid, and its truncation to the levels a backend actually hosts.

use serde::{Deserialize, Serialize};

use crate::error::TileError;
use crate::tile::TileAddress;

pub const WEB_MERCATOR_WKID: u32 = 3857;

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;

/// Half the width of the Web Mercator square, in metres.
pub const WEB_MERCATOR_HALF_EXTENT: f64 = std::f64::consts::PI * WGS84_A;

/// Map scale denominators assume 96 dpi and the 39.37 in/m survey ratio
/// used by published Web Mercator tile schemes.
const INCHES_PER_METER: f64 = 39.37;
const DPI: f64 = 96.0;

/// One level of detail.
///
/// `level` is the number the tile service uses in its URLs. It travels with
/// the descriptor, so dropping neighbouring levels never renumbers it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lod {
    pub level: u8,
    /// Ground metres per pixel.
    pub resolution: f64,
    pub scale: f64,
}

/// Inclusive range of levels backed by tile data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub min: u8,
    pub max: u8,
}

impl LevelRange {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, level: u8) -> bool {
        level >= self.min && level <= self.max
    }
}

/// Axis-aligned extent in the geometry's spatial reference.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Grid geometry shared by an imagery source and anything draped on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTileGeometry")]
pub struct TileGeometry {
    pub wkid: u32,
    /// Top-left corner of tile (0, 0) at every level.
    pub origin: [f64; 2],
    /// Tile edge length in pixels.
    pub tile_size: u32,
    lods: Vec<Lod>,
}

/// Wire form of [`TileGeometry`], checked before it is accepted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTileGeometry {
    wkid: u32,
    origin: [f64; 2],
    tile_size: u32,
    lods: Vec<Lod>,
}

impl TryFrom<RawTileGeometry> for TileGeometry {
    type Error = TileError;

    fn try_from(raw: RawTileGeometry) -> Result<Self, Self::Error> {
        if raw.tile_size == 0 {
            return Err(TileError::InvalidGeometry("tile size is zero".to_string()));
        }
        if raw.lods.is_empty() {
            return Err(TileError::InvalidGeometry("no levels of detail".to_string()));
        }
        ensure_contiguous(&raw.lods)?;
        Ok(TileGeometry {
            wkid: raw.wkid,
            origin: raw.origin,
            tile_size: raw.tile_size,
            lods: raw.lods,
        })
    }
}

fn ensure_contiguous(lods: &[Lod]) -> Result<(), TileError> {
    if lods
        .windows(2)
        .any(|w| w[0].level.checked_add(1) != Some(w[1].level))
    {
        return Err(TileError::InvalidGeometry(
            "levels are not contiguous".to_string(),
        ));
    }
    Ok(())
}

impl TileGeometry {
    /// The standard Web Mercator pyramid, levels `0..levels`.
    pub fn web_mercator(tile_size: u32, levels: u8) -> Self {
        let base_resolution = 2.0 * WEB_MERCATOR_HALF_EXTENT / tile_size as f64;
        let lods = (0..levels)
            .map(|level| {
                let resolution = base_resolution / 2f64.powi(level as i32);
                Lod {
                    level,
                    resolution,
                    scale: resolution * DPI * INCHES_PER_METER,
                }
            })
            .collect();

        Self {
            wkid: WEB_MERCATOR_WKID,
            origin: [-WEB_MERCATOR_HALF_EXTENT, WEB_MERCATOR_HALF_EXTENT],
            tile_size,
            lods,
        }
    }

    pub fn lods(&self) -> &[Lod] {
        &self.lods
    }

    pub fn lod(&self, level: u8) -> Option<&Lod> {
        self.lods.iter().find(|lod| lod.level == level)
    }

    pub fn min_level(&self) -> Option<u8> {
        self.lods.first().map(|lod| lod.level)
    }

    pub fn max_level(&self) -> Option<u8> {
        self.lods.last().map(|lod| lod.level)
    }

    /// Keep only the levels in `hosted`.
    ///
    /// Head and tail levels are dropped; the retained descriptors are not
    /// touched. Truncating an already truncated geometry with the same range
    /// is a no-op.
    pub fn truncate(&self, hosted: LevelRange) -> Result<TileGeometry, TileError> {
        if hosted.min > hosted.max {
            return Err(TileError::InvalidGeometry(format!(
                "hosted range {}..={} is empty",
                hosted.min, hosted.max
            )));
        }

        let lods: Vec<Lod> = self
            .lods
            .iter()
            .filter(|lod| hosted.contains(lod.level))
            .copied()
            .collect();

        if lods.is_empty() {
            return Err(TileError::InvalidGeometry(format!(
                "no advertised level falls in {}..={}",
                hosted.min, hosted.max
            )));
        }

        ensure_contiguous(&lods)?;

        Ok(TileGeometry {
            wkid: self.wkid,
            origin: self.origin,
            tile_size: self.tile_size,
            lods,
        })
    }

    pub fn contains(&self, address: TileAddress) -> bool {
        self.lod(address.level).is_some() && address.in_grid()
    }

    /// Reject addresses this geometry cannot serve.
    pub fn check(&self, address: TileAddress) -> Result<(), TileError> {
        if self.contains(address) {
            Ok(())
        } else {
            Err(TileError::out_of_range(address))
        }
    }

    /// Ground extent covered by a tile.
    pub fn tile_bounds(&self, address: TileAddress) -> Option<Extent> {
        if !address.in_grid() {
            return None;
        }
        let lod = self.lod(address.level)?;
        let span = lod.resolution * self.tile_size as f64;
        let xmin = self.origin[0] + address.col as f64 * span;
        let ymax = self.origin[1] - address.row as f64 * span;
        Some(Extent {
            xmin,
            ymin: ymax - span,
            xmax: xmin + span,
            ymax,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_mercator_level_zero_covers_the_world() {
        let geometry = TileGeometry::web_mercator(256, 10);
        assert_eq!(geometry.lods().len(), 10);

        let world = geometry.tile_bounds(TileAddress::new(0, 0, 0)).unwrap();
        assert!((world.xmin + WEB_MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((world.xmax - WEB_MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((world.ymax - WEB_MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((world.ymin + WEB_MERCATOR_HALF_EXTENT).abs() < 1e-6);

        let lod0 = geometry.lod(0).unwrap();
        assert!((lod0.resolution - 156_543.033_928).abs() < 1e-3);
        assert!((lod0.scale - 591_657_527.591).abs() < 1.0);

        let lod8 = geometry.lod(8).unwrap();
        assert!((lod8.scale - 591_657_527.591 / 256.0).abs() < 1e-2);
    }

    #[test]
    fn truncation_drops_head_and_tail() {
        let advertised = TileGeometry::web_mercator(256, 10);
        let hosted = advertised.truncate(LevelRange::new(1, 8)).unwrap();

        assert_eq!(hosted.lods().len(), advertised.lods().len() - 2);
        assert_eq!(hosted.min_level(), Some(1));
        assert_eq!(hosted.max_level(), Some(8));
        assert!(hosted.lod(0).is_none());
        assert!(hosted.lod(9).is_none());
    }

    #[test]
    fn truncation_is_idempotent() {
        let advertised = TileGeometry::web_mercator(256, 24);
        let once = advertised.truncate(LevelRange::new(1, 8)).unwrap();
        let twice = once.truncate(LevelRange::new(1, 8)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn truncation_keeps_levels_pinned_to_their_tiles() {
        let advertised = TileGeometry::web_mercator(256, 10);
        let hosted = advertised.truncate(LevelRange::new(1, 8)).unwrap();

        for level in 1..=8u8 {
            assert_eq!(hosted.lod(level), advertised.lod(level));
            let address = TileAddress::new(level, 1, 1);
            assert_eq!(hosted.tile_bounds(address), advertised.tile_bounds(address));
        }
    }

    #[test]
    fn empty_or_disjoint_ranges_are_rejected() {
        let advertised = TileGeometry::web_mercator(256, 10);
        assert!(matches!(
            advertised.truncate(LevelRange::new(5, 2)),
            Err(TileError::InvalidGeometry(_))
        ));
        assert!(matches!(
            advertised.truncate(LevelRange::new(12, 14)),
            Err(TileError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn check_rejects_unhosted_levels_and_off_grid_tiles() {
        let hosted = TileGeometry::web_mercator(256, 10)
            .truncate(LevelRange::new(1, 8))
            .unwrap();

        assert!(hosted.check(TileAddress::new(1, 1, 1)).is_ok());
        assert!(hosted.check(TileAddress::new(0, 0, 0)).is_err());
        assert!(hosted.check(TileAddress::new(9, 0, 0)).is_err());
        assert!(hosted.check(TileAddress::new(2, 4, 0)).is_err());
    }

    #[test]
    fn serialises_with_camel_case_fields() {
        let geometry = TileGeometry::web_mercator(256, 2);
        let json = serde_json::to_value(&geometry).unwrap();
        assert_eq!(json["wkid"], 3857);
        assert_eq!(json["tileSize"], 256);
        assert_eq!(json["lods"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn deserialising_enforces_level_invariants() {
        let geometry = TileGeometry::web_mercator(256, 4)
            .truncate(LevelRange::new(1, 3))
            .unwrap();
        let json = serde_json::to_value(&geometry).unwrap();
        let back: TileGeometry = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, geometry);

        let mut empty = json.clone();
        empty["lods"] = serde_json::json!([]);
        assert!(serde_json::from_value::<TileGeometry>(empty).is_err());

        let mut gapped = json.clone();
        gapped["lods"].as_array_mut().unwrap().remove(1);
        assert!(serde_json::from_value::<TileGeometry>(gapped).is_err());

        let mut zero_size = json;
        zero_size["tileSize"] = serde_json::json!(0);
        assert!(serde_json::from_value::<TileGeometry>(zero_size).is_err());
    }
}
