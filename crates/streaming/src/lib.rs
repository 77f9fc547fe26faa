//! Imagery tile streaming: addressing, tiling geometry and tile sources.

pub mod config;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod http;
pub mod memory;
pub mod source;
pub mod tile;

pub use config::*;
pub use decode::*;
pub use error::*;
pub use geometry::*;
pub use http::*;
pub use memory::*;
pub use source::*;
pub use tile::*;
