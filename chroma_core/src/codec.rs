//! Reversible text ↔ color codec.
//!
//! Encoding maps each character (ASCII-uppercased) to its palette color and
//! renders a strip of swatches with captions. Decoding is an exact reverse
//! lookup. The textual interchange form of a [`ColorSequence`] is
//! `(r,g,b),(r,g,b),...`.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChromaError, Result};
use crate::glyph::{self, CAPTION_FONT};
use crate::palette::{Palette, Rgb};

/// Color assigned to characters missing from the palette.
pub const FALLBACK_COLOR: Rgb = Rgb::new(100, 100, 100);
/// Character emitted for colors missing from the palette.
pub const UNKNOWN_CHAR: char = '?';

/// Ordered colors, one per encoded character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorSequence(Vec<Rgb>);

impl ColorSequence {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self(colors)
    }

    pub fn as_slice(&self) -> &[Rgb] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rgb> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Rgb> {
        self.0
    }
}

impl From<Vec<Rgb>> for ColorSequence {
    fn from(colors: Vec<Rgb>) -> Self {
        Self(colors)
    }
}

impl FromIterator<Rgb> for ColorSequence {
    fn from_iter<I: IntoIterator<Item = Rgb>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ColorSequence {
    type Item = &'a Rgb;
    type IntoIter = std::slice::Iter<'a, Rgb>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ColorSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, color) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

impl FromStr for ColorSequence {
    type Err = ChromaError;

    /// Parse `(r,g,b),(r,g,b)`, optionally wrapped in `[...]`, with free
    /// whitespace around tokens. Every triple must have exactly three
    /// integer components in 0..=255.
    fn from_str(s: &str) -> Result<Self> {
        let mut rest = s.trim();
        if let Some(inner) = rest.strip_prefix('[') {
            rest = inner
                .strip_suffix(']')
                .ok_or_else(|| ChromaError::malformed(0, "unbalanced '[' bracket"))?
                .trim();
        } else if rest.ends_with(']') {
            return Err(ChromaError::malformed(0, "unbalanced ']' bracket"));
        }
        if rest.is_empty() {
            return Err(ChromaError::EmptyInput);
        }

        let mut colors = Vec::new();
        loop {
            let index = colors.len();
            let after_open = rest
                .strip_prefix('(')
                .ok_or_else(|| ChromaError::malformed(index, "expected '('"))?;
            let close = after_open
                .find(')')
                .ok_or_else(|| ChromaError::malformed(index, "missing ')'"))?;
            colors.push(parse_triple(&after_open[..close], index)?);

            rest = after_open[close + 1..].trim_start();
            if rest.is_empty() {
                break;
            }
            rest = rest
                .strip_prefix(',')
                .ok_or_else(|| ChromaError::malformed(index + 1, "expected ',' between triples"))?
                .trim_start();
            if rest.is_empty() {
                return Err(ChromaError::malformed(index + 1, "trailing ','"));
            }
        }
        Ok(Self(colors))
    }
}

fn parse_triple(body: &str, index: usize) -> Result<Rgb> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ChromaError::malformed(
            index,
            format!("expected 3 components, found {}", parts.len()),
        ));
    }
    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        *slot = part.parse::<u8>().map_err(|_| {
            ChromaError::malformed(index, format!("component {part:?} is not an integer in 0..=255"))
        })?;
    }
    Ok(Rgb::from(channels))
}

/// Cell geometry for the rendered strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_width: 200,
            cell_height: 200,
        }
    }
}

impl RenderOptions {
    pub fn square(size: u32) -> Self {
        Self {
            cell_width: size,
            cell_height: size,
        }
    }

    pub fn caption_height(&self) -> u32 {
        self.cell_height / 2
    }

    /// Integer upscale for the caption glyph, keeping it within two thirds
    /// of the caption band.
    fn glyph_scale(&self) -> u32 {
        let by_height = self.caption_height() * 2 / 3 / CAPTION_FONT.character_size.height;
        let by_width = self.cell_width * 2 / 3 / CAPTION_FONT.character_size.width;
        by_height.min(by_width).max(1)
    }
}

/// Output of [`encode`].
#[derive(Debug, Clone)]
pub struct Encoded {
    pub colors: ColorSequence,
    pub image: RgbImage,
}

fn fold(c: char) -> char {
    c.to_ascii_uppercase()
}

/// Map each character of `text` to its color. Never fails; characters
/// missing from the palette get [`FALLBACK_COLOR`].
pub fn encode_colors(text: &str, palette: &Palette) -> ColorSequence {
    let mut unknown = 0usize;
    let colors = text
        .chars()
        .map(|c| {
            palette.color_of(fold(c)).unwrap_or_else(|| {
                unknown += 1;
                FALLBACK_COLOR
            })
        })
        .collect();
    if unknown > 0 {
        debug!("{} character(s) outside the palette encoded as fallback", unknown);
    }
    colors
}

/// Render `colors` as swatches with the matching characters of `text` as
/// captions beneath them.
pub fn render(text: &str, colors: &ColorSequence, options: RenderOptions) -> Result<RgbImage> {
    if colors.is_empty() {
        return Err(ChromaError::EmptyInput);
    }
    let chars = text.chars().count();
    if chars != colors.len() {
        return Err(ChromaError::InvalidParameter(format!(
            "{} caption character(s) for {} color(s)",
            chars,
            colors.len()
        )));
    }
    if options.cell_width == 0 || options.cell_height < 2 {
        return Err(ChromaError::InvalidParameter(format!(
            "cell size {}x{} is too small",
            options.cell_width, options.cell_height
        )));
    }
    let width = (colors.len() as u32)
        .checked_mul(options.cell_width)
        .filter(|_| colors.len() <= u32::MAX as usize)
        .ok_or_else(|| ChromaError::InvalidParameter("rendered image too wide".to_string()))?;
    let caption = options.caption_height();
    let height = options.cell_height + caption;

    let mut image = RgbImage::from_pixel(width, height, Rgb::WHITE.into());
    let scale = options.glyph_scale();

    for (i, (c, color)) in text.chars().zip(colors.iter()).enumerate() {
        let x0 = i as u32 * options.cell_width;
        let fill: image::Rgb<u8> = (*color).into();
        for y in 0..options.cell_height {
            for x in x0..x0 + options.cell_width {
                image.put_pixel(x, y, fill);
            }
        }

        let mut buf = [0u8; 4];
        glyph::draw_text_centered(
            &mut image,
            c.encode_utf8(&mut buf),
            (
                (x0 + options.cell_width / 2) as i64,
                (options.cell_height + caption / 2) as i64,
            ),
            CAPTION_FONT,
            scale,
            Rgb::BLACK,
        );
    }
    Ok(image)
}

/// Encode `text` into its color sequence and rendered strip.
pub fn encode(text: &str, palette: &Palette, options: RenderOptions) -> Result<Encoded> {
    if text.is_empty() {
        return Err(ChromaError::EmptyInput);
    }
    let colors = encode_colors(text, palette);
    let image = render(text, &colors, options)?;
    Ok(Encoded { colors, image })
}

/// Reverse lookup of every color; unmatched colors become [`UNKNOWN_CHAR`].
pub fn decode(colors: &ColorSequence, palette: &Palette) -> String {
    let mut unknown = 0usize;
    let text: String = colors
        .iter()
        .map(|&color| {
            palette.char_of(color).unwrap_or_else(|| {
                unknown += 1;
                UNKNOWN_CHAR
            })
        })
        .collect();
    if unknown > 0 {
        debug!("{} color(s) outside the palette decoded as {:?}", unknown, UNKNOWN_CHAR);
    }
    text
}

/// Parse the textual form and decode it in one step.
pub fn decode_str(color_code: &str, palette: &Palette) -> Result<String> {
    let colors: ColorSequence = color_code.parse()?;
    Ok(decode(&colors, palette))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed_index(err: ChromaError) -> usize {
        match err {
            ChromaError::MalformedColorSequence { index, .. } => index,
            other => panic!("expected MalformedColorSequence, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_uppercases() {
        let palette = Palette::default();
        let colors = encode_colors("Hello, World!", &palette);
        assert_eq!(decode(&colors, &palette), "HELLO, WORLD!");
    }

    #[test]
    fn test_length_preserved_with_non_ascii() {
        let palette = Palette::default();
        let text = "straße ñ 日本";
        let colors = encode_colors(text, &palette);
        assert_eq!(colors.len(), text.chars().count());
        assert_eq!(colors.as_slice()[4], FALLBACK_COLOR);
    }

    #[test]
    fn test_fallbacks() {
        let palette = Palette::default();
        assert_eq!(encode_colors("#", &palette).as_slice(), &[FALLBACK_COLOR]);
        let unknown = ColorSequence::new(vec![Rgb::new(1, 2, 3), FALLBACK_COLOR]);
        assert_eq!(decode(&unknown, &palette), "??");
        assert_eq!(encode_colors("", &palette).len(), 0);
    }

    #[test]
    fn test_a1_example() {
        let palette = Palette::default();
        let colors = encode_colors("A1", &palette);
        assert_eq!(colors.to_string(), "(0,153,97),(255,124,101)");
        assert_eq!(decode_str(&colors.to_string(), &palette).unwrap(), "A1");
    }

    #[test]
    fn test_parse_tolerates_brackets_and_whitespace() {
        let expected = ColorSequence::new(vec![Rgb::new(12, 200, 45), Rgb::new(0, 0, 0)]);
        for input in [
            "(12,200,45),(0,0,0)",
            "  [(12, 200, 45), (0, 0, 0)]  ",
            "[ ( 12 ,200,45 ) ,\n(0,0,0) ]",
        ] {
            assert_eq!(input.parse::<ColorSequence>().unwrap(), expected, "{input:?}");
        }
    }

    #[test]
    fn test_parse_rejects_short_triple() {
        let err = "(1,2),(3,4,5)".parse::<ColorSequence>().unwrap_err();
        assert_eq!(malformed_index(err), 0);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let cases = [
            ("(1,2,3),(4,5,6,7)", 1),
            ("(1,2,3),(4,x,6)", 1),
            ("(1,2,256)", 0),
            ("(1,2,-1)", 0),
            ("(1,2,3)(4,5,6)", 1),
            ("(1,2,3),", 1),
            ("(1,2,3", 0),
            ("1,2,3", 0),
            ("[(1,2,3)", 0),
            ("(1,2,3)]", 0),
            ("(1,2,3) junk", 1),
        ];
        for (input, index) in cases {
            let err = input.parse::<ColorSequence>().unwrap_err();
            assert_eq!(malformed_index(err), index, "{input:?}");
        }
    }

    #[test]
    fn test_parse_empty_is_empty_input() {
        for input in ["", "   ", "[]", "[ ]"] {
            assert!(
                matches!(input.parse::<ColorSequence>(), Err(ChromaError::EmptyInput)),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_display_parse_round_trip() {
        let palette = Palette::default();
        let colors = encode_colors("ROUND TRIP 42?", &palette);
        let text = colors.to_string();
        assert!(!text.contains(' '));
        assert_eq!(text.parse::<ColorSequence>().unwrap(), colors);
    }

    #[test]
    fn test_render_geometry() {
        let palette = Palette::default();
        let options = RenderOptions::square(40);
        let encoded = encode("AB", &palette, options).unwrap();
        assert_eq!(encoded.image.dimensions(), (80, 60));

        let a: image::Rgb<u8> = palette.color_of('A').unwrap().into();
        let b: image::Rgb<u8> = palette.color_of('B').unwrap().into();
        assert_eq!(*encoded.image.get_pixel(0, 0), a);
        assert_eq!(*encoded.image.get_pixel(39, 39), a);
        assert_eq!(*encoded.image.get_pixel(40, 0), b);
        assert_eq!(*encoded.image.get_pixel(79, 39), b);
        // Caption corners stay white.
        assert_eq!(*encoded.image.get_pixel(0, 59), image::Rgb([255, 255, 255]));
        assert_eq!(*encoded.image.get_pixel(79, 40), image::Rgb([255, 255, 255]));
    }

    #[test]
    fn test_render_draws_caption_glyph() {
        let palette = Palette::default();
        let encoded = encode("X", &palette, RenderOptions::default()).unwrap();
        let ink = encoded
            .image
            .enumerate_pixels()
            .filter(|(_, y, p)| *y >= 200 && p.0 == [0, 0, 0])
            .count();
        assert!(ink > 0);
    }

    #[test]
    fn test_render_rejects_caption_length_mismatch() {
        let palette = Palette::default();
        let colors = encode_colors("AB", &palette);
        for text in ["A", "ABC"] {
            assert!(matches!(
                render(text, &colors, RenderOptions::square(8)),
                Err(ChromaError::InvalidParameter(_))
            ));
        }
        assert!(render("ab", &colors, RenderOptions::square(8)).is_ok());
    }

    #[test]
    fn test_encode_rejects_empty_and_bad_cells() {
        let palette = Palette::default();
        assert!(matches!(
            encode("", &palette, RenderOptions::default()),
            Err(ChromaError::EmptyInput)
        ));
        assert!(matches!(
            encode("A", &palette, RenderOptions::square(0)),
            Err(ChromaError::InvalidParameter(_))
        ));
    }
}
