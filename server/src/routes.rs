use std::sync::atomic::Ordering;

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chroma_core::{
    chunk_png, decode_str, encode, encode_png, extract_file, render_wav_spectrogram, ColorSequence,
    ColorizeOptions, Palette, RenderOptions, Rgb,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ApiError;
use crate::validation::{validate_color_code, validate_text};
use crate::AppState;

#[derive(Deserialize)]
pub struct TextToColorRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct TextToColorResponse {
    pub color_code: String,
    pub colors: ColorSequence,
    /// Base64 PNG tiles, left to right.
    pub image_chunks: Vec<String>,
    pub tile_width: u32,
}

#[derive(Deserialize)]
pub struct ColorToTextRequest {
    pub color_code: String,
}

#[derive(Serialize)]
pub struct ColorToTextResponse {
    pub text: String,
    pub color_code: String,
}

#[derive(Serialize)]
pub struct PaletteEntry {
    pub character: char,
    pub rgb: Rgb,
}

#[derive(Serialize)]
pub struct SpectrogramResponse {
    pub image_png_base64: String,
    pub sample_rate: u32,
    pub duration_ms: u64,
    pub frames: usize,
    pub bins: usize,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub request_count: u64,
    pub uptime_seconds: u64,
}

/// Run CPU-bound work off the async runtime.
async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|join_err| {
        error!("Task join error: {join_err}");
        ApiError::InternalError(format!("Task join error: {join_err}"))
    })?
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::InvalidInput(format!("Malformed multipart body: {e}"))
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        request_count: state.request_count.load(Ordering::Relaxed),
        uptime_seconds: state.started.elapsed().as_secs(),
    })
}

pub async fn palette_endpoint(State(state): State<AppState>) -> Json<Vec<PaletteEntry>> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let palette = Palette::default();
    Json(
        palette
            .entries()
            .iter()
            .map(|&(character, rgb)| PaletteEntry { character, rgb })
            .collect(),
    )
}

/// Encode, render and tile `text` on the blocking pool.
async fn encode_to_response(
    state: &AppState,
    text: String,
    max_length: usize,
) -> Result<TextToColorResponse, ApiError> {
    validate_text(&text, max_length)?;
    let tile_width = state.config.tile_width;
    let cell = RenderOptions::square(state.config.cell_size);
    let start = std::time::Instant::now();

    let response = run_blocking(move || {
        let palette = Palette::default();
        let encoded = encode(&text, &palette, cell)?;
        let image_chunks = chunk_png(&encoded.image, tile_width)?
            .iter()
            .map(|png| STANDARD.encode(png))
            .collect();
        Ok(TextToColorResponse {
            color_code: encoded.colors.to_string(),
            colors: encoded.colors,
            image_chunks,
            tile_width,
        })
    })
    .await?;

    info!(
        "Encoded {} character(s) into {} tile(s) in {:?}",
        response.colors.len(),
        response.image_chunks.len(),
        start.elapsed()
    );
    Ok(response)
}

pub async fn text_to_color(
    State(state): State<AppState>,
    Json(req): Json<TextToColorRequest>,
) -> Result<Json<TextToColorResponse>, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    encode_to_response(&state, req.text, state.config.max_text_length)
        .await
        .map(Json)
}

/// Accepts either a `text` field or a `file` field (.txt, .docx, .pdf).
pub async fn text_to_color_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TextToColorResponse>, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let mut text: Option<String> = None;
    let mut from_document = false;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") => {
                // Forms post an empty `text` alongside a file; fall through to the file.
                let value = field.text().await.map_err(multipart_error)?;
                if !value.trim().is_empty() {
                    text = Some(value);
                }
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                info!("Extracting text from upload {:?} ({} bytes)", file_name, bytes.len());
                text = Some(run_blocking(move || Ok(extract_file(&file_name, &bytes)?)).await?);
                from_document = true;
            }
            _ => {}
        }
        if text.is_some() {
            break;
        }
    }

    let text = text.ok_or_else(|| {
        ApiError::InvalidInput("Expected a `text` field or a `file` upload".to_string())
    })?;

    let max_length = if from_document {
        let limit = state.config.max_document_length;
        let chars = text.chars().count();
        if chars > limit {
            return Err(ApiError::InvalidInput(format!(
                "Document text too long ({} characters, max {}); documents are not truncated",
                chars, limit
            )));
        }
        limit
    } else {
        state.config.max_text_length
    };
    encode_to_response(&state, text, max_length).await.map(Json)
}

pub async fn color_to_text(
    State(state): State<AppState>,
    Json(req): Json<ColorToTextRequest>,
) -> Result<Json<ColorToTextResponse>, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    validate_color_code(&req.color_code, state.config.max_text_length)?;

    let palette = Palette::default();
    let text = decode_str(&req.color_code, &palette)?;
    info!("Decoded {} color(s)", text.chars().count());
    Ok(Json(ColorToTextResponse {
        text,
        color_code: req.color_code,
    }))
}

pub async fn spectrogram_endpoint(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SpectrogramResponse>, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let mut wav = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            wav = Some(field.bytes().await.map_err(multipart_error)?);
            break;
        }
    }
    let wav = wav.ok_or_else(|| ApiError::InvalidInput("Expected a `file` upload".to_string()))?;
    let start = std::time::Instant::now();

    let response = run_blocking(move || {
        let (spectrum, image, audio) = render_wav_spectrogram(&wav, ColorizeOptions::default())?;
        let (bins, frames) = spectrum.magnitude_db.dim();
        Ok(SpectrogramResponse {
            image_png_base64: STANDARD.encode(encode_png(&image)?),
            sample_rate: spectrum.sample_rate,
            duration_ms: audio.duration_ms(),
            frames,
            bins,
        })
    })
    .await?;

    info!(
        "Rendered spectrogram: {} Hz, {} ms, {} frames in {:?}",
        response.sample_rate,
        response.duration_ms,
        response.frames,
        start.elapsed()
    );
    Ok(Json(response))
}
