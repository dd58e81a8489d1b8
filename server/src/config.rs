// Configuration for the server, read from the environment

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Largest accepted request body (uploads included).
    pub max_upload_bytes: usize,
    /// Longest text accepted for encoding, in characters.
    pub max_text_length: usize,
    /// Longest text extracted from an uploaded document, in characters.
    pub max_document_length: usize,
    /// Width of the PNG tiles returned by `/text-to-color`.
    pub tile_width: u32,
    /// Side of one rendered color swatch.
    pub cell_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8085,
            rate_limit_per_minute: 60,
            request_timeout_secs: 60,
            cors_allowed_origins: None,
            max_upload_bytes: 20 * 1024 * 1024,
            max_text_length: 256,
            max_document_length: 1024,
            tile_width: 200,
            cell_size: 200,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });

        Self {
            port: env_or("PORT", defaults.port),
            rate_limit_per_minute: env_or("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)
                .max(1),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            cors_allowed_origins,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            max_text_length: env_or("MAX_TEXT_LENGTH", defaults.max_text_length),
            max_document_length: env_or("MAX_DOCUMENT_LENGTH", defaults.max_document_length),
            // Zero would make the chunker reject every request.
            tile_width: env_or("TILE_WIDTH", defaults.tile_width).max(1),
            cell_size: env_or("CELL_SIZE", defaults.cell_size).max(2),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
