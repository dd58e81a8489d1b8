use thiserror::Error;

/// Errors surfaced by the chroma core and its collaborators.
///
/// Unknown characters during encoding and unknown colors during decoding are
/// not errors: they resolve to the fallback color and placeholder character.
#[derive(Debug, Error)]
pub enum ChromaError {
    #[error("Unsupported input format: {0}")]
    UnsupportedInputFormat(String),

    #[error("No input provided")]
    EmptyInput,

    #[error("Malformed color sequence at triple {index}: {reason}")]
    MalformedColorSequence { index: usize, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Audio decode error: {0}")]
    Audio(#[from] hound::Error),

    #[error("Document extraction failed: {0}")]
    Document(String),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

impl ChromaError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        ChromaError::MalformedColorSequence {
            index,
            reason: reason.into(),
        }
    }
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, ChromaError>`.
pub type Result<T> = std::result::Result<T, ChromaError>;
