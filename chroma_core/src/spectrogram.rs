//! Rasterize a dB spectrogram with the frequency colormap.
//!
//! Layout: Hz labels in the left margin, time labels in the bottom margin,
//! and a color bar labelled in dB on the right. The frequency axis is
//! logarithmic from the first non-DC bin up to Nyquist.

use image::RgbImage;
use ndarray::Array2;

use crate::colormap::build_colormap;
use crate::error::{ChromaError, Result};
use crate::glyph::{self, text_size, LABEL_FONT};
use crate::palette::Rgb;

pub const LEFT_MARGIN: u32 = 64;
pub const TOP_MARGIN: u32 = 10;
pub const BOTTOM_MARGIN: u32 = 30;
pub const COLORBAR_GAP: u32 = 16;
pub const COLORBAR_WIDTH: u32 = 20;
pub const RIGHT_MARGIN: u32 = COLORBAR_GAP + COLORBAR_WIDTH + 60;

const TICK: u32 = 4;
const LUT_SIZE: usize = 256;
/// Upper bound on color bar labels; the step widens to stay under it.
const MAX_DB_TICKS: usize = 20;
const COLORBAR_TITLE: &str = "Decibels";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorizeOptions {
    /// Plot area width in pixels.
    pub width: u32,
    /// Plot area height in pixels.
    pub height: u32,
    /// Samples between STFT columns, for the time axis.
    pub hop_length: usize,
    /// Colormap control points.
    pub num_colors: usize,
    /// Spacing of color bar labels.
    pub db_tick_step: f32,
}

impl Default for ColorizeOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 400,
            hop_length: 512,
            num_colors: 256,
            db_tick_step: 20.0,
        }
    }
}

impl ColorizeOptions {
    /// `(x, y, width, height)` of the plot area inside the image.
    pub fn plot_rect(&self) -> (u32, u32, u32, u32) {
        (LEFT_MARGIN, TOP_MARGIN, self.width, self.height)
    }

    /// `(x, y, width, height)` of the color bar inside the image.
    pub fn colorbar_rect(&self) -> (u32, u32, u32, u32) {
        (
            LEFT_MARGIN + self.width + COLORBAR_GAP,
            TOP_MARGIN,
            COLORBAR_WIDTH,
            self.height,
        )
    }

    pub fn image_size(&self) -> (u32, u32) {
        (
            LEFT_MARGIN + self.width + RIGHT_MARGIN,
            TOP_MARGIN + self.height + BOTTOM_MARGIN,
        )
    }
}

/// Log-spaced frequency axis: maps pixel rows to bins.
struct LogAxis {
    f_lo: f64,
    f_hi: f64,
    bin_hz: f64,
    rows: usize,
}

impl LogAxis {
    fn new(rows: usize, sample_rate: u32) -> Option<Self> {
        if rows < 3 {
            return None;
        }
        let f_hi = sample_rate as f64 / 2.0;
        let bin_hz = f_hi / (rows - 1) as f64;
        Some(Self {
            f_lo: bin_hz,
            f_hi,
            bin_hz,
            rows,
        })
    }

    /// Fraction of the axis height (0 = bottom) at which `freq` sits.
    fn fraction(&self, freq: f64) -> f64 {
        (freq / self.f_lo).ln() / (self.f_hi / self.f_lo).ln()
    }

    fn bin_at(&self, fraction: f64) -> usize {
        let freq = self.f_lo * (self.f_hi / self.f_lo).powf(fraction);
        ((freq / self.bin_hz).round() as usize).clamp(1, self.rows - 1)
    }
}

fn row_fraction(y: u32, height: u32) -> f64 {
    if height <= 1 {
        0.0
    } else {
        (height - 1 - y) as f64 / (height - 1) as f64
    }
}

fn format_db(v: f32) -> String {
    // Normalize -0.0 so the zero label reads "+0 dB".
    format!("{:+.0} dB", v + 0.0)
}

/// dB values to label on the color bar: multiples of `step` inside
/// `[vmin, vmax]`, at most [`MAX_DB_TICKS`] of them. A flat range or a
/// non-positive step yields the single value `vmax`.
fn colorbar_ticks(vmin: f32, vmax: f32, step: f32) -> Vec<f32> {
    let (lo, hi, mut step) = (vmin as f64, vmax as f64, step as f64);
    let span = hi - lo;
    if !(span > 0.0 && span.is_finite() && step > 0.0 && step.is_finite()) {
        return vec![vmax];
    }
    let needed = span / step;
    if needed > MAX_DB_TICKS as f64 {
        step *= (needed / MAX_DB_TICKS as f64).ceil();
    }
    let first = (lo / step).ceil() * step;
    (0..=MAX_DB_TICKS)
        .map(|k| first + k as f64 * step)
        .take_while(|&v| v <= hi)
        .map(|v| v as f32)
        .collect()
}

fn format_seconds(t: f64, step: f64) -> String {
    if step < 1.0 {
        format!("{t:.1}s")
    } else {
        format!("{t:.0}s")
    }
}

/// Render `magnitude_db` (rows = frequency bins from DC to Nyquist, columns =
/// time frames) using the colormap built for `sample_rate`.
pub fn colorize(
    magnitude_db: &Array2<f32>,
    sample_rate: u32,
    options: ColorizeOptions,
) -> Result<RgbImage> {
    let (rows, frames) = magnitude_db.dim();
    if rows == 0 || frames == 0 {
        return Err(ChromaError::EmptyInput);
    }
    if options.width == 0 || options.height == 0 {
        return Err(ChromaError::InvalidParameter(
            "plot area must be at least 1x1".to_string(),
        ));
    }
    let lut = build_colormap(sample_rate, options.num_colors)?.lut(LUT_SIZE);

    let finite = magnitude_db.iter().copied().filter(|v| v.is_finite());
    let (vmin, vmax) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (vmin, vmax) = if vmin <= vmax { (vmin, vmax) } else { (0.0, 0.0) };
    let span = vmax - vmin;
    let color_for = |v: f32| -> image::Rgb<u8> {
        let norm = if span > 0.0 && v.is_finite() {
            ((v - vmin) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        lut[(norm * (LUT_SIZE - 1) as f32).round() as usize].into()
    };

    let (img_w, img_h) = options.image_size();
    let mut image = RgbImage::from_pixel(img_w, img_h, Rgb::WHITE.into());
    let (px, py, pw, ph) = options.plot_rect();

    let axis = LogAxis::new(rows, sample_rate);
    let row_bins: Vec<usize> = (0..ph)
        .map(|y| match &axis {
            Some(axis) => axis.bin_at(row_fraction(y, ph)),
            None => ((row_fraction(y, ph) * (rows - 1) as f64).round()) as usize,
        })
        .collect();
    let col_frames: Vec<usize> = (0..pw)
        .map(|x| ((x as usize * frames) / pw as usize).min(frames - 1))
        .collect();

    for (y, &bin) in row_bins.iter().enumerate() {
        for (x, &frame) in col_frames.iter().enumerate() {
            let color = color_for(magnitude_db[[bin, frame]]);
            image.put_pixel(px + x as u32, py + y as u32, color);
        }
    }

    draw_frequency_ticks(&mut image, axis.as_ref(), &options);
    draw_time_ticks(&mut image, frames, sample_rate, &options);
    draw_colorbar(&mut image, &lut, vmin, vmax, &options);
    Ok(image)
}

fn hline(image: &mut RgbImage, x0: u32, x1: u32, y: u32) {
    for x in x0..x1 {
        image.put_pixel(x, y, Rgb::BLACK.into());
    }
}

fn vline(image: &mut RgbImage, x: u32, y0: u32, y1: u32) {
    for y in y0..y1 {
        image.put_pixel(x, y, Rgb::BLACK.into());
    }
}

fn draw_frequency_ticks(image: &mut RgbImage, axis: Option<&LogAxis>, options: &ColorizeOptions) {
    let Some(axis) = axis else { return };
    let (px, py, _, ph) = options.plot_rect();
    let mut freq = 64.0;
    while freq <= axis.f_hi {
        if freq >= axis.f_lo {
            let fraction = axis.fraction(freq);
            let y = py + ph - 1 - (fraction * (ph - 1) as f64).round() as u32;
            hline(image, px - TICK, px, y);
            let label = format!("{freq:.0} Hz");
            let (w, h) = text_size(&label, LABEL_FONT, 1);
            let x = px as i64 - TICK as i64 - 2 - w as i64;
            glyph::draw_text(image, &label, (x, y as i64 - h as i64 / 2), LABEL_FONT, 1, Rgb::BLACK);
        }
        freq *= 2.0;
    }
}

fn draw_time_ticks(image: &mut RgbImage, frames: usize, sample_rate: u32, options: &ColorizeOptions) {
    let (px, py, pw, ph) = options.plot_rect();
    let duration = frames as f64 * options.hop_length as f64 / sample_rate as f64;
    if duration <= 0.0 {
        return;
    }
    let step = [0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0]
        .into_iter()
        .find(|step| duration / step <= 10.0)
        .unwrap_or(600.0);

    let base = py + ph;
    let mut k = 0u32;
    loop {
        let t = k as f64 * step;
        if t > duration {
            break;
        }
        let x = px + ((t / duration) * (pw - 1) as f64).round() as u32;
        vline(image, x, base, base + TICK);
        let label = format_seconds(t, step);
        glyph::draw_text_centered(
            image,
            &label,
            (x as i64, (base + TICK + 8) as i64),
            LABEL_FONT,
            1,
            Rgb::BLACK,
        );
        k += 1;
    }
}

fn draw_colorbar(image: &mut RgbImage, lut: &[Rgb], vmin: f32, vmax: f32, options: &ColorizeOptions) {
    let (bx, by, bw, bh) = options.colorbar_rect();
    for y in 0..bh {
        let norm = row_fraction(y, bh);
        let color: image::Rgb<u8> = lut[(norm * (lut.len() - 1) as f64).round() as usize].into();
        for x in bx..bx + bw {
            image.put_pixel(x, by + y, color);
        }
    }

    let label_x = (bx + bw + TICK + 2) as i64;
    let mut put_label = |value: f32, y: u32| {
        hline(image, bx + bw, bx + bw + TICK, y);
        let label = format_db(value);
        let (_, h) = text_size(&label, LABEL_FONT, 1);
        glyph::draw_text(image, &label, (label_x, y as i64 - h as i64 / 2), LABEL_FONT, 1, Rgb::BLACK);
    };

    let ticks = colorbar_ticks(vmin, vmax, options.db_tick_step);
    let span = (vmax - vmin) as f64;
    for value in ticks {
        let y = if span > 0.0 {
            by + (((vmax as f64 - value as f64) / span) * (bh - 1) as f64).round() as u32
        } else {
            by
        };
        put_label(value, y);
    }

    let title_y = (by + bh + TICK + 3) as i64;
    glyph::draw_text(image, COLORBAR_TITLE, (bx as i64, title_y), LABEL_FONT, 1, Rgb::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ColorizeOptions {
        ColorizeOptions {
            width: 100,
            height: 50,
            hop_length: 512,
            num_colors: 256,
            db_tick_step: 20.0,
        }
    }

    fn lut(sample_rate: u32) -> Vec<Rgb> {
        build_colormap(sample_rate, 256).unwrap().lut(LUT_SIZE)
    }

    #[test]
    fn test_image_geometry() {
        let db = Array2::<f32>::zeros((5, 4));
        let image = colorize(&db, 22_050, small()).unwrap();
        assert_eq!(image.dimensions(), small().image_size());
        assert_eq!(image.dimensions(), (100 + LEFT_MARGIN + RIGHT_MARGIN, 50 + TOP_MARGIN + BOTTOM_MARGIN));
    }

    #[test]
    fn test_loudest_frame_gets_top_color() {
        // Column c sits at -10·c dB.
        let db = Array2::from_shape_fn((5, 4), |(_, c)| -10.0 * c as f32);
        let image = colorize(&db, 22_050, small()).unwrap();
        let (px, py, pw, ph) = small().plot_rect();
        let lut = lut(22_050);
        let top: image::Rgb<u8> = lut[255].into();
        assert_eq!(*image.get_pixel(px, py + ph / 2), top);
        assert_eq!(*image.get_pixel(px + pw - 1, py + ph / 2), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn test_log_axis_orientation() {
        // Row r sits at r dB, so high bins are loudest.
        let db = Array2::from_shape_fn((5, 3), |(r, _)| r as f32);
        let image = colorize(&db, 8_000, small()).unwrap();
        let (px, py, _, ph) = small().plot_rect();
        let lut = lut(8_000);
        let top: image::Rgb<u8> = lut[255].into();
        let bottom: image::Rgb<u8> = lut[64].into();
        assert_eq!(*image.get_pixel(px + 1, py), top);
        assert_eq!(*image.get_pixel(px + 1, py + ph - 1), bottom);
    }

    #[test]
    fn test_colorbar_spans_lut() {
        let db = Array2::from_shape_fn((9, 6), |(r, c)| -((r * c) as f32));
        let image = colorize(&db, 16_000, small()).unwrap();
        let (bx, by, _, bh) = small().colorbar_rect();
        let lut = lut(16_000);
        let top: image::Rgb<u8> = lut[255].into();
        assert_eq!(*image.get_pixel(bx + 1, by), top);
        assert_eq!(*image.get_pixel(bx + 1, by + bh - 1), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn test_labels_are_drawn() {
        let db = Array2::from_shape_fn((1025, 40), |(r, c)| -(((r + c) % 80) as f32));
        let options = ColorizeOptions::default();
        let image = colorize(&db, 22_050, options).unwrap();
        let (bx, _, bw, _) = options.colorbar_rect();
        let dark_right = image
            .enumerate_pixels()
            .filter(|(x, _, p)| *x > bx + bw && p.0 == [0, 0, 0])
            .count();
        let dark_left = image
            .enumerate_pixels()
            .filter(|(x, _, p)| *x < LEFT_MARGIN && p.0 == [0, 0, 0])
            .count();
        assert!(dark_right > 0);
        assert!(dark_left > 0);
    }

    #[test]
    fn test_flat_matrix_is_silence() {
        let db = Array2::from_elem((4, 4), -12.0f32);
        let image = colorize(&db, 22_050, small()).unwrap();
        let (px, py, _, _) = small().plot_rect();
        assert_eq!(*image.get_pixel(px + 3, py + 3), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn test_colorbar_ticks() {
        assert_eq!(colorbar_ticks(-80.0, 0.0, 20.0), vec![-80.0, -60.0, -40.0, -20.0, 0.0]);
        assert_eq!(colorbar_ticks(-45.0, -5.0, 20.0), vec![-40.0, -20.0]);
        assert_eq!(colorbar_ticks(-3.0, -3.0, 20.0), vec![-3.0]);
        assert_eq!(colorbar_ticks(-80.0, 0.0, 0.0), vec![0.0]);
    }

    #[test]
    fn test_wide_db_range_is_bounded() {
        let ticks = colorbar_ticks(-1e10, 0.0, 20.0);
        assert!(!ticks.is_empty() && ticks.len() <= MAX_DB_TICKS + 1);
        assert!(ticks.windows(2).all(|w| w[1] > w[0]));
        assert!(ticks.iter().all(|&v| (-1e10..=0.0).contains(&v)));

        let db = Array2::from_shape_vec((1, 2), vec![-1e10f32, 0.0]).unwrap();
        let image = colorize(&db, 22_050, small()).unwrap();
        assert_eq!(image.dimensions(), small().image_size());
    }

    #[test]
    fn test_colorbar_title_below_bar() {
        let db = Array2::from_shape_fn((5, 4), |(r, c)| -((r * c) as f32));
        let image = colorize(&db, 22_050, small()).unwrap();
        let (bx, by, _, bh) = small().colorbar_rect();
        let (title_w, title_h) = text_size(COLORBAR_TITLE, LABEL_FONT, 1);
        let top = by + bh + TICK + 3;
        let ink = (bx..bx + title_w)
            .flat_map(|x| (top..top + title_h).map(move |y| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y).0 == [0, 0, 0])
            .count();
        assert!(ink > 0);
        assert_eq!(COLORBAR_TITLE, "Decibels");
    }

    #[test]
    fn test_db_label_format() {
        assert_eq!(format_db(0.0), "+0 dB");
        assert_eq!(format_db(-0.0), "+0 dB");
        assert_eq!(format_db(-40.0), "-40 dB");
    }

    #[test]
    fn test_rejects_empty_and_bad_options() {
        assert!(matches!(
            colorize(&Array2::<f32>::zeros((0, 3)), 22_050, small()),
            Err(ChromaError::EmptyInput)
        ));
        let bad = ColorizeOptions { width: 0, ..small() };
        assert!(matches!(
            colorize(&Array2::<f32>::zeros((3, 3)), 22_050, bad),
            Err(ChromaError::InvalidParameter(_))
        ));
        assert!(matches!(
            colorize(&Array2::<f32>::zeros((3, 3)), 0, small()),
            Err(ChromaError::InvalidParameter(_))
        ));
    }
}
