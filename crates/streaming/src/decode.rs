use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::TileError;

/// Decode a compressed tile (PNG or JPEG) into an RGBA byte buffer.
///
/// Sources without an alpha channel come back fully opaque.
pub fn decode_tile_image(bytes: &[u8]) -> Result<RgbaImage, TileError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| TileError::network_with_source("failed to decode tile image", e))?;
    Ok(decoded.to_rgba8())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, TileError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| TileError::network_with_source("failed to encode tile image", e))?;
    Ok(out.into_inner())
}
