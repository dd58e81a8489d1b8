pub mod config;
pub mod error;
pub mod routes;
pub mod validation;

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes::{
    color_to_text, health_check, metrics_endpoint, palette_endpoint, spectrogram_endpoint,
    text_to_color, text_to_color_upload,
};

#[derive(Clone)]
pub struct AppState {
    pub request_count: Arc<AtomicU64>,
    pub config: ServerConfig,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            request_count: Arc::new(AtomicU64::new(0)),
            config,
            started: Instant::now(),
        }
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let Some(allowed_origins) = &config.cors_allowed_origins else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        return base.allow_origin(Any);
    };
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
        base.allow_origin(Any)
    } else {
        info!("CORS configured for {} origin(s)", origins.len());
        base.allow_origin(AllowOrigin::list(origins))
    }
}

/// Tag every request and its response with an `x-request-id`.
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header {
        request.headers_mut().insert("x-request-id", value.clone());
    }
    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Assemble the application: routes mounted at the root and under `/api`,
/// wrapped in tracing, rate limiting, timeout, CORS and body-size layers.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let config = state.config.clone();

    // Global key: every client shares one bucket, which behaves the same
    // behind proxies where peer addresses are unreliable.
    let replenish_ms = (60_000 / config.rate_limit_per_minute.max(1) as u64).max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms)
            .burst_size(config.rate_limit_per_minute.max(1))
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
    );
    info!("Rate limiting: {} requests per minute", config.rate_limit_per_minute);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(&config))
        .into_inner();

    let public_api = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/palette", get(palette_endpoint))
        .route("/text-to-color", post(text_to_color))
        .route("/text-to-color/upload", post(text_to_color_upload))
        .route("/color-to-text", post(color_to_text))
        .route("/spectrogram", post(spectrogram_endpoint));

    // Metrics endpoint - consider adding authentication in production
    let metrics_api = Router::new().route("/metrics", get(metrics_endpoint));

    let api = Router::new().merge(public_api).merge(metrics_api);

    Ok(Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state))
}
