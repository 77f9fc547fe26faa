use serde::{Deserialize, Serialize};

/// Marks cells without data. Luminance elevations are never negative, so it
/// cannot collide with a real sample.
pub const NO_DATA_VALUE: f64 = -1.0;

/// Row-major elevation samples for one tile, in metres.
///
/// Serialises with the field names host engines expect: `values`, `width`,
/// `height`, `noDataValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationGrid {
    pub values: Vec<f64>,
    pub width: u32,
    pub height: u32,
    pub no_data_value: f64,
}

impl ElevationGrid {
    pub fn new(values: Vec<f64>, width: u32, height: u32) -> Self {
        debug_assert_eq!(values.len(), width as usize * height as usize);
        Self {
            values,
            width,
            height,
            no_data_value: NO_DATA_VALUE,
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .copied()
            .filter(|v| *v != self.no_data_value)
    }

    /// Lowest and highest sample, ignoring no-data cells.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.samples().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    pub fn mean(&self) -> Option<f64> {
        let (count, sum) = self
            .samples()
            .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
        (count > 0).then(|| sum / count as f64)
    }
}
