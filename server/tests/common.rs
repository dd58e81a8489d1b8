//! Common utilities for integration tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use server::{build_router, config::ServerConfig, AppState};
use tower::ServiceExt;

pub const BOUNDARY: &str = "chroma-test-boundary";

/// Create a test app with small cells so responses stay light.
pub fn create_test_app() -> Router {
    let config = ServerConfig {
        cell_size: 20,
        tile_width: 50,
        max_text_length: 64,
        max_document_length: 128,
        ..ServerConfig::default()
    };
    build_router(AppState::new(config)).expect("router should build")
}

/// Send one request through a fresh app and decode the JSON body.
pub async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = create_test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// One multipart part: `(field name, optional file name, payload)`.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_post(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, payload) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A short 16-bit mono sine tone as WAV bytes.
pub fn tone_wav(freq: f32, sample_rate: u32, seconds: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let n = (sample_rate as f32 * seconds) as usize;
        for i in 0..n {
            let t = i as f32 / sample_rate as f32;
            let s = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5;
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
