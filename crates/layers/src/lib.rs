pub mod elevation;
pub mod grid;
pub mod layer;
pub mod luminance;

pub use elevation::*;
pub use grid::*;
pub use layer::*;
