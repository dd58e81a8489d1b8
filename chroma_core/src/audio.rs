//! Audio collaborator: WAV decoding, short-time Fourier transform and
//! amplitude → decibel conversion feeding the spectrogram colorizer.

use std::io::Cursor;

use mel_spec::prelude::*;
use ndarray::Array2;
use num_complex::Complex;
use tracing::debug;

use crate::error::{ChromaError, Result};

/// Mono PCM audio normalized to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Audio {
    pub fn duration_ms(&self) -> u64 {
        (self.samples.len() as f64 / self.sample_rate as f64 * 1000.0) as u64
    }
}

/// Decode a RIFF/WAV payload, averaging channels down to mono.
pub fn decode_wav(bytes: &[u8]) -> Result<Audio> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| match e {
        hound::Error::FormatError(_) | hound::Error::IoError(_) | hound::Error::Unsupported => {
            ChromaError::UnsupportedInputFormat(format!("not a readable WAV file: {e}"))
        }
        other => ChromaError::Audio(other),
    })?;
    let spec = reader.spec();
    if spec.sample_rate == 0 || spec.channels == 0 {
        return Err(ChromaError::UnsupportedInputFormat(
            "WAV header declares no channels or a zero sample rate".to_string(),
        ));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = spec.channels as usize;
    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    if samples.is_empty() {
        return Err(ChromaError::EmptyInput);
    }

    debug!(
        "decoded WAV: {} Hz, {} channel(s), {} frames",
        spec.sample_rate,
        channels,
        samples.len()
    );
    Ok(Audio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// STFT frame geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StftOptions {
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Default for StftOptions {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
        }
    }
}

/// Magnitude spectrum with `n_fft / 2 + 1` rows (DC … Nyquist) and one
/// column per hop. The tail is zero-padded to a whole hop.
pub fn stft_magnitude(samples: &[f32], options: StftOptions) -> Result<Array2<f32>> {
    let StftOptions { n_fft, hop_length } = options;
    if n_fft < 2 || hop_length == 0 || hop_length > n_fft {
        return Err(ChromaError::InvalidParameter(format!(
            "invalid STFT geometry n_fft={n_fft} hop={hop_length}"
        )));
    }
    if samples.is_empty() {
        return Err(ChromaError::EmptyInput);
    }

    let bins = n_fft / 2 + 1;
    let mut stft = Spectrogram::new(n_fft, hop_length);
    let mut columns: Vec<Vec<f32>> = Vec::new();
    let mut push_hop = |slice: &[f32], columns: &mut Vec<Vec<f32>>| {
        if let Some(fft_frame) = stft.add(slice) {
            let mut column: Vec<f32> = fft_frame
                .into_iter()
                .take(bins)
                .map(|c: Complex<f64>| c.norm() as f32)
                .collect();
            column.resize(bins, 0.0);
            columns.push(column);
        }
    };

    for chunk in samples.chunks(hop_length) {
        if chunk.len() == hop_length {
            push_hop(chunk, &mut columns);
        } else {
            let mut padded = chunk.to_vec();
            padded.resize(hop_length, 0.0);
            push_hop(&padded, &mut columns);
        }
    }
    // Signals shorter than one window: flush with silence until a frame
    // comes out.
    let silence = vec![0.0f32; hop_length];
    let mut flushes = n_fft / hop_length + 1;
    while columns.is_empty() && flushes > 0 {
        push_hop(&silence, &mut columns);
        flushes -= 1;
    }
    if columns.is_empty() {
        return Err(ChromaError::EmptyInput);
    }

    let frames = columns.len();
    Ok(Array2::from_shape_fn((bins, frames), |(row, col)| columns[col][row]))
}

/// Convert amplitudes to dB relative to the loudest bin:
/// `20·log10(max(amin, S) / max(amin, max S))`, floored at `-top_db`.
pub fn amplitude_to_db(magnitude: &Array2<f32>, amin: f32, top_db: f32) -> Array2<f32> {
    let reference = magnitude.iter().copied().fold(amin, f32::max);
    let ref_db = 20.0 * reference.log10();
    let db = magnitude.mapv(|s| 20.0 * s.max(amin).log10() - ref_db);
    let ceiling = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    db.mapv(|v| v.max(ceiling - top_db))
}

/// dB spectrogram ready for [`crate::spectrogram::colorize`].
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub magnitude_db: Array2<f32>,
    pub sample_rate: u32,
    pub hop_length: usize,
}

/// STFT + dB conversion with `amin = 1e-5` and an 80 dB floor.
pub fn spectrogram_db(audio: &Audio, options: StftOptions) -> Result<Spectrum> {
    let magnitude = stft_magnitude(&audio.samples, options)?;
    Ok(Spectrum {
        magnitude_db: amplitude_to_db(&magnitude, 1e-5, 80.0),
        sample_rate: audio.sample_rate,
        hop_length: options.hop_length,
    })
}
