//! Frequency → hue colormap for spectrogram rendering.
//!
//! Control point 0 is pinned to black ("no energy"). Every other point `i`
//! stands for the frequency `i / num_colors · nyquist`, and its hue is that
//! frequency normalized by the Nyquist frequency, so color encodes the
//! frequency band. The map is rebuilt for every sample rate.

use crate::error::{ChromaError, Result};
use crate::palette::{hls_to_rgb, Rgb};

/// Color of control point 0.
pub const SILENCE_COLOR: Rgb = Rgb::BLACK;

/// One control point of a [`Colormap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgb,
    /// Hue in [0, 1); `None` for the silence point.
    pub hue: Option<f64>,
    /// Represented frequency in Hz; `None` for the silence point.
    pub frequency: Option<f64>,
}

/// Ordered control points with linear interpolation between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<ColorStop>,
}

/// Build the frequency colormap for `sample_rate` with `num_colors` points.
pub fn build_colormap(sample_rate: u32, num_colors: usize) -> Result<Colormap> {
    if sample_rate == 0 {
        return Err(ChromaError::InvalidParameter(
            "sample rate must be positive".to_string(),
        ));
    }
    if num_colors < 2 {
        return Err(ChromaError::InvalidParameter(format!(
            "colormap needs at least 2 colors, got {num_colors}"
        )));
    }

    let nyquist = sample_rate as f64 / 2.0;
    let last = (num_colors - 1) as f64;
    let mut stops = Vec::with_capacity(num_colors);
    stops.push(ColorStop {
        position: 0.0,
        color: SILENCE_COLOR,
        hue: None,
        frequency: None,
    });
    for i in 1..num_colors {
        let frequency = i as f64 / num_colors as f64 * nyquist;
        let hue = frequency / nyquist;
        stops.push(ColorStop {
            position: i as f64 / last,
            color: Rgb::from_unit_rounded(hls_to_rgb(hue, 0.5, 1.0)),
            hue: Some(hue),
            frequency: Some(frequency),
        });
    }
    Ok(Colormap { stops })
}

impl Colormap {
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Hue assigned to control point `i`, if it is a frequency point.
    pub fn hue_of(&self, i: usize) -> Option<f64> {
        self.stops.get(i).and_then(|s| s.hue)
    }

    /// Interpolated color at `t` (clamped to [0, 1]).
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let upper = self
            .stops
            .partition_point(|s| s.position < t)
            .clamp(1, self.stops.len() - 1);
        let (a, b) = (&self.stops[upper - 1], &self.stops[upper]);
        let span = b.position - a.position;
        let f = if span > 0.0 { (t - a.position) / span } else { 0.0 };
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
        Rgb::new(
            lerp(a.color.r, b.color.r),
            lerp(a.color.g, b.color.g),
            lerp(a.color.b, b.color.b),
        )
    }

    /// Sample the map at `n` evenly spaced positions.
    pub fn lut(&self, n: usize) -> Vec<Rgb> {
        match n {
            0 => Vec::new(),
            1 => vec![self.sample(0.0)],
            _ => (0..n)
                .map(|i| self.sample(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_pinned_at_zero() {
        let map = build_colormap(22_050, 256).unwrap();
        assert_eq!(map.len(), 256);
        assert_eq!(map.stops()[0].position, 0.0);
        assert_eq!(map.stops()[0].color, SILENCE_COLOR);
        assert_eq!(map.sample(0.0), SILENCE_COLOR);
        assert_eq!(map.hue_of(0), None);
        assert_eq!(map.stops()[255].position, 1.0);
    }

    #[test]
    fn test_hue_monotonic_in_frequency() {
        for sr in [8_000u32, 22_050, 44_100] {
            let map = build_colormap(sr, 64).unwrap();
            let points: Vec<(f64, f64)> = map.stops()[1..]
                .iter()
                .map(|s| (s.frequency.unwrap(), s.hue.unwrap()))
                .collect();
            for pair in points.windows(2) {
                assert!(pair[1].0 > pair[0].0);
                assert!(pair[1].1 >= pair[0].1);
            }
            let nyquist = sr as f64 / 2.0;
            assert!(points.iter().all(|&(f, h)| f < nyquist && (0.0..1.0).contains(&h)));
        }
    }

    #[test]
    fn test_hue_independent_of_sample_rate() {
        let a = build_colormap(8_000, 16).unwrap();
        let b = build_colormap(48_000, 16).unwrap();
        for i in 1..16 {
            assert!((a.hue_of(i).unwrap() - b.hue_of(i).unwrap()).abs() < 1e-12);
        }
        assert_ne!(a.stops()[3].frequency, b.stops()[3].frequency);
    }

    #[test]
    fn test_frequency_point_colors() {
        let map = build_colormap(22_050, 2).unwrap();
        // i = 1 of 2: hue 0.5 (cyan) at position 1.
        assert_eq!(map.stops()[1].color, Rgb::new(0, 255, 255));
        let map = build_colormap(22_050, 360).unwrap();
        let c = map.stops()[1].color;
        assert_eq!(c.r, 255);
        assert!(c.b == 0 && c.g < 10);
    }

    #[test]
    fn test_sample_interpolates_and_clamps() {
        let map = build_colormap(1_000, 2).unwrap();
        assert_eq!(map.sample(-3.0), SILENCE_COLOR);
        assert_eq!(map.sample(1.0), Rgb::new(0, 255, 255));
        assert_eq!(map.sample(7.0), Rgb::new(0, 255, 255));
        assert_eq!(map.sample(0.5), Rgb::new(0, 128, 128));
        assert_eq!(map.sample(f64::NAN), SILENCE_COLOR);
    }

    #[test]
    fn test_lut_endpoints() {
        let map = build_colormap(16_000, 256).unwrap();
        let lut = map.lut(256);
        assert_eq!(lut.len(), 256);
        assert_eq!(lut[0], SILENCE_COLOR);
        assert_eq!(lut[255], map.stops()[255].color);
        assert!(map.lut(0).is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(build_colormap(0, 256), Err(ChromaError::InvalidParameter(_))));
        assert!(matches!(build_colormap(22_050, 1), Err(ChromaError::InvalidParameter(_))));
    }
}
