//! Text drawing on `image` rasters using embedded-graphics bitmap fonts.
//!
//! The fonts are compiled in, so rendering never depends on system fonts.

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, ascii::FONT_6X10, MonoFont, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use image::RgbImage;

use crate::palette::Rgb;

/// Large font used for captions.
pub const CAPTION_FONT: &MonoFont<'static> = &FONT_10X20;
/// Small font used for axis and color bar labels.
pub const LABEL_FONT: &MonoFont<'static> = &FONT_6X10;

/// A draw target writing into an `RgbImage`, each logical pixel expanded to
/// a `scale × scale` block placed at `origin`. Pixels outside the image are
/// dropped.
pub struct Canvas<'a> {
    image: &'a mut RgbImage,
    origin: (i64, i64),
    scale: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(image: &'a mut RgbImage, origin: (i64, i64), scale: u32) -> Self {
        Self {
            image,
            origin,
            scale: scale.max(1),
        }
    }

    fn put_block(&mut self, point: Point, color: image::Rgb<u8>) {
        let (w, h) = self.image.dimensions();
        let s = self.scale as i64;
        let x0 = self.origin.0 + point.x as i64 * s;
        let y0 = self.origin.1 + point.y as i64 * s;
        for y in y0..y0 + s {
            for x in x0..x0 + s {
                if x >= 0 && y >= 0 && x < w as i64 && y < h as i64 {
                    self.image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        let (w, h) = self.image.dimensions();
        Size::new(w / self.scale, h / self.scale)
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.put_block(point, image::Rgb([color.r(), color.g(), color.b()]));
        }
        Ok(())
    }
}

/// Pixel size of `text` drawn with `font` at `scale`.
pub fn text_size(text: &str, font: &MonoFont<'_>, scale: u32) -> (u32, u32) {
    let n = text.chars().count() as u32;
    let advance = font.character_size.width + font.character_spacing;
    let width = (n * advance).saturating_sub(font.character_spacing);
    (width * scale, font.character_size.height * scale)
}

/// Draw `text` with its top-left corner at `(x, y)`.
pub fn draw_text(
    image: &mut RgbImage,
    text: &str,
    (x, y): (i64, i64),
    font: &MonoFont<'_>,
    scale: u32,
    color: Rgb,
) {
    let style = MonoTextStyle::new(font, Rgb888::new(color.r, color.g, color.b));
    let mut canvas = Canvas::new(image, (x, y), scale);
    let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut canvas);
}

/// Draw `text` centered on `(cx, cy)`.
pub fn draw_text_centered(
    image: &mut RgbImage,
    text: &str,
    (cx, cy): (i64, i64),
    font: &MonoFont<'_>,
    scale: u32,
    color: Rgb,
) {
    let (w, h) = text_size(text, font, scale);
    draw_text(
        image,
        text,
        (cx - w as i64 / 2, cy - h as i64 / 2),
        font,
        scale,
        color,
    );
}
