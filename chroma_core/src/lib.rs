//! Reversible text ↔ color encoding, image tiling and frequency-hue
//! spectrogram rendering.

pub mod audio;
pub mod chunk;
pub mod codec;
pub mod colormap;
pub mod document;
pub mod error;
pub mod glyph;
pub mod palette;
pub mod spectrogram;

pub use audio::{decode_wav, spectrogram_db, Audio, Spectrum, StftOptions};
pub use chunk::{chunk, chunk_png, encode_png};
pub use codec::{
    decode, decode_str, encode, encode_colors, render, ColorSequence, Encoded, RenderOptions,
    FALLBACK_COLOR, UNKNOWN_CHAR,
};
pub use colormap::{build_colormap, Colormap};
pub use document::{extract_file, extract_text, DocumentKind};
pub use error::{ChromaError, Result};
pub use palette::{generate_palette, Alphabet, Palette, Rgb, DEFAULT_ALPHABET};
pub use spectrogram::{colorize, ColorizeOptions};

/// Decode `wav` and render its colorized spectrogram with the default STFT
/// geometry (`n_fft` 2048, hop 512).
pub fn render_wav_spectrogram(
    wav: &[u8],
    options: ColorizeOptions,
) -> Result<(Spectrum, image::RgbImage, Audio)> {
    let audio = decode_wav(wav)?;
    let stft = StftOptions {
        hop_length: options.hop_length,
        ..StftOptions::default()
    };
    let spectrum = spectrogram_db(&audio, stft)?;
    let image = colorize(&spectrum.magnitude_db, spectrum.sample_rate, options)?;
    Ok((spectrum, image, audio))
}
