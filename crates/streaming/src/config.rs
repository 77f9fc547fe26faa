use serde::{Deserialize, Serialize};

use crate::error::TileError;
use crate::geometry::{LevelRange, TileGeometry};

/// VIIRS Black Marble 2016 composite served by NASA GIBS.
pub const BLACK_MARBLE_URL_TEMPLATE: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/VIIRS_Black_Marble/default/2016-01-01/GoogleMapsCompatible_Level8/{level}/{row}/{col}.png";

pub const BLACK_MARBLE_ATTRIBUTION: &str = "Imagery provided by services from the Global Imagery Browse Services (GIBS), operated by the NASA/GSFC/Earth Science Data and Information System (ESDIS) with funding provided by NASA/HQ.";

const PLACEHOLDERS: [&str; 3] = ["{level}", "{row}", "{col}"];

/// Where imagery tiles live and which part of the advertised pyramid is real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSourceConfig {
    /// URL with `{level}`, `{row}` and `{col}` placeholders.
    pub url_template: String,
    pub tile_size: u32,
    /// Levels the service advertises, starting at 0.
    pub advertised_levels: u8,
    /// First and last level that actually have tiles.
    pub min_level: u8,
    pub max_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            url_template: BLACK_MARBLE_URL_TEMPLATE.to_string(),
            tile_size: 256,
            advertised_levels: 24,
            min_level: 1,
            max_level: 8,
            attribution: Some(BLACK_MARBLE_ATTRIBUTION.to_string()),
        }
    }
}

impl TileSourceConfig {
    pub fn with_url_template(mut self, url_template: impl Into<String>) -> Self {
        self.url_template = url_template.into();
        self
    }

    pub fn with_levels(mut self, advertised_levels: u8, min_level: u8, max_level: u8) -> Self {
        self.advertised_levels = advertised_levels;
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn hosted_levels(&self) -> LevelRange {
        LevelRange::new(self.min_level, self.max_level)
    }

    pub fn advertised_geometry(&self) -> TileGeometry {
        TileGeometry::web_mercator(self.tile_size, self.advertised_levels)
    }

    /// The advertised pyramid cut down to the hosted levels.
    pub fn resolve_geometry(&self) -> Result<TileGeometry, TileError> {
        if self.tile_size == 0 {
            return Err(TileError::InvalidGeometry("tile size is zero".to_string()));
        }
        if let Some(missing) = PLACEHOLDERS
            .iter()
            .find(|p| !self.url_template.contains(**p))
        {
            return Err(TileError::InvalidGeometry(format!(
                "url template has no {missing} placeholder"
            )));
        }
        self.advertised_geometry().truncate(self.hosted_levels())
    }
}

#[cfg(test)]
mod tests {
    use super::TileSourceConfig;
    use crate::error::TileError;

    #[test]
    fn default_hosts_levels_one_through_eight() {
        let geometry = TileSourceConfig::default().resolve_geometry().unwrap();
        assert_eq!(geometry.min_level(), Some(1));
        assert_eq!(geometry.max_level(), Some(8));
        assert_eq!(geometry.lods().len(), 8);
        assert_eq!(geometry.tile_size, 256);
    }

    #[test]
    fn template_must_carry_every_placeholder() {
        let config = TileSourceConfig::default().with_url_template("https://tiles/{level}/{col}.png");
        let err = config.resolve_geometry().unwrap_err();
        assert!(matches!(err, TileError::InvalidGeometry(ref m) if m.contains("{row}")));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = TileSourceConfig::default().with_levels(10, 1, 8);
        let json = serde_json::to_string(&config).unwrap();
        let back: TileSourceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
