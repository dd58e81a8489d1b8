//! Splitting rendered strips into fixed-width tiles and PNG serialization.

use image::{codecs::png::PngEncoder, imageops, ColorType, ImageEncoder, RgbImage};

use crate::error::{ChromaError, Result};

/// Split `image` into vertical strips `tile_width` pixels wide, left to right.
/// The last strip is narrower when the width is not a multiple of `tile_width`.
pub fn chunk(image: &RgbImage, tile_width: u32) -> Result<Vec<RgbImage>> {
    if tile_width == 0 {
        return Err(ChromaError::InvalidParameter(
            "tile width must be at least 1".to_string(),
        ));
    }
    let (width, height) = image.dimensions();
    let tiles = (0..width)
        .step_by(tile_width as usize)
        .map(|x| {
            let w = tile_width.min(width - x);
            imageops::crop_imm(image, x, 0, w, height).to_image()
        })
        .collect();
    Ok(tiles)
}

/// Encode an RGB raster as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    // Raw RGB payload plus a little header/zlib overhead.
    let mut png_bytes: Vec<u8> = Vec::with_capacity(image.as_raw().len() / 4 + 64);
    PngEncoder::new(&mut png_bytes).write_image(image.as_raw(), width, height, ColorType::Rgb8)?;
    Ok(png_bytes)
}

/// [`chunk`] followed by [`encode_png`] on every tile.
pub fn chunk_png(image: &RgbImage, tile_width: u32) -> Result<Vec<Vec<u8>>> {
    chunk(image, tile_width)?.iter().map(encode_png).collect()
}
