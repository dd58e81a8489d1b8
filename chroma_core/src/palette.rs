//! Deterministic character → color palette.
//!
//! Every character of an [`Alphabet`] gets one RGB triple derived from its
//! index alone. Hues are scrambled by squaring the index before reducing it
//! modulo the alphabet length, so neighbouring characters such as `'0'` and
//! `'1'` land on distant hues; lightness alternates between two bands and
//! saturation cycles with period three.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChromaError, Result};

/// Digits, uppercase letters and a small punctuation set.
pub const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ!?., ";

/// An 8-bit RGB triple. Serializes as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Scale unit-interval channels to 0..=255, truncating like `int(255 * x)`.
    pub fn from_unit(channels: [f64; 3]) -> Self {
        let scale = |x: f64| (255.0 * x.clamp(0.0, 1.0)) as u8;
        Rgb::new(scale(channels[0]), scale(channels[1]), scale(channels[2]))
    }

    /// Scale unit-interval channels to 0..=255, rounding to nearest.
    pub fn from_unit_rounded(channels: [f64; 3]) -> Self {
        let scale = |x: f64| (255.0 * x.clamp(0.0, 1.0)).round() as u8;
        Rgb::new(scale(channels[0]), scale(channels[1]), scale(channels[2]))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)
    }
}

const ONE_THIRD: f64 = 1.0 / 3.0;
const ONE_SIXTH: f64 = 1.0 / 6.0;
const TWO_THIRD: f64 = 2.0 / 3.0;

/// Convert hue/lightness/saturation (all nominally in [0, 1]) to unit RGB.
///
/// Hue wraps with a Euclidean remainder, so `h + 1/3` and `h - 1/3` never
/// leave the unit circle. Channels are not clamped here.
pub fn hls_to_rgb(h: f64, l: f64, s: f64) -> [f64; 3] {
    if s == 0.0 {
        return [l, l, l];
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - (l * s) };
    let m1 = 2.0 * l - m2;
    [
        hue_channel(m1, m2, h + ONE_THIRD),
        hue_channel(m1, m2, h),
        hue_channel(m1, m2, h - ONE_THIRD),
    ]
}

fn hue_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < ONE_SIXTH {
        return m1 + (m2 - m1) * hue * 6.0;
    }
    if hue < 0.5 {
        return m2;
    }
    if hue < TWO_THIRD {
        return m1 + (m2 - m1) * (TWO_THIRD - hue) * 6.0;
    }
    m1
}

/// Ordered set of characters covered by a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet, rejecting empty input and duplicate characters.
    pub fn new(chars: &str) -> Result<Self> {
        let chars: Vec<char> = chars.chars().collect();
        if chars.is_empty() {
            return Err(ChromaError::InvalidParameter(
                "alphabet must contain at least one character".to_string(),
            ));
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(ChromaError::InvalidParameter(format!(
                    "duplicate character {c:?} in alphabet"
                )));
            }
        }
        Ok(Self { chars })
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

/// Character → color mapping plus its precomputed reverse index.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<(char, Rgb)>,
    by_char: HashMap<char, Rgb>,
    by_color: HashMap<Rgb, char>,
}

impl Palette {
    pub fn entries(&self) -> &[(char, Rgb)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn color_of(&self, c: char) -> Option<Rgb> {
        self.by_char.get(&c).copied()
    }

    /// Reverse lookup. On a collision the character earliest in the
    /// alphabet is returned.
    pub fn char_of(&self, color: Rgb) -> Option<char> {
        self.by_color.get(&color).copied()
    }

    /// Pairs of characters sharing a color, in alphabet order.
    pub fn collisions(&self) -> Vec<(char, char)> {
        self.entries
            .iter()
            .filter_map(|&(c, color)| {
                let first = self.by_color[&color];
                (first != c).then_some((first, c))
            })
            .collect()
    }
}

/// Build the palette for `alphabet`. Pure: equal alphabets give equal palettes.
pub fn generate_palette(alphabet: &Alphabet) -> Palette {
    let n = alphabet.len();
    let mut entries = Vec::with_capacity(n);
    let mut by_char = HashMap::with_capacity(n);
    let mut by_color = HashMap::with_capacity(n);

    for (i, &c) in alphabet.chars().iter().enumerate() {
        let hue = ((i * i) % n) as f64 / n as f64;
        let lightness = 0.3 + (i % 2) as f64 * 0.4;
        // 0.8 + 0.6 * 2 exceeds the HLS domain every third character.
        let saturation = (0.8 + (i % 3) as f64 * 0.6).min(1.0);
        let color = Rgb::from_unit(hls_to_rgb(hue, lightness, saturation));

        entries.push((c, color));
        by_char.insert(c, color);
        by_color.entry(color).or_insert(c);
    }

    Palette {
        entries,
        by_char,
        by_color,
    }
}

impl Default for Palette {
    fn default() -> Self {
        generate_palette(&Alphabet::default())
    }
}
