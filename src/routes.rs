//! HTTP boundary: request parsing, error mapping, and response shaping
//! around the compressor.

use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::Multipart;
use base64::{engine::general_purpose, Engine as _};
use humansize::{format_size, DECIMAL};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::compressor;
use crate::error::CompressError;
use crate::formats::{CompressionFormat, EncoderFamily};
use crate::models::{
    normalize_filename, CompressRequest, CompressResponse, ErrorResponse, FormatsResponse,
    HealthResponse,
};
use crate::stats;

#[derive(Debug, Clone)]
pub struct AppState {
    /// Include internal error text in error responses.
    pub debug: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/compress/base64", post(compress_base64))
        .route("/compress/upload", post(compress_upload))
        .route("/compress/formats", get(supported_formats))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "imgsquash",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "API for image compression using native Rust encoders",
        "endpoints": {
            "compress_base64": "/compress/base64",
            "compress_upload": "/compress/upload",
            "supported_formats": "/compress/formats",
            "health": "/health",
        },
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "imgsquash",
        version: env!("CARGO_PKG_VERSION"),
        encoders: EncoderFamily::ALL.iter().map(|f| f.token()).collect(),
    })
}

async fn supported_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: CompressionFormat::ALL
            .iter()
            .map(|f| (f.token(), f.description()))
            .collect(),
    })
}

async fn compress_base64(
    State(state): State<AppState>,
    Json(request): Json<CompressRequest>,
) -> Response {
    log::info!(
        "🔍 API: base64 compression - format: {}, quality: {}",
        request.format,
        request.quality
    );

    if !(1..=100).contains(&request.quality) {
        return compress_error_response(&CompressError::InvalidQuality(request.quality), state.debug);
    }

    let payload = strip_data_url_prefix(&request.image_base64);
    let image_bytes = match general_purpose::STANDARD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("❌ API: invalid base64 payload: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Error decoding base64: {e}"),
                None,
                state.debug,
            );
        }
    };

    let filename = normalize_filename(request.filename.as_deref());
    run_compression(&state, image_bytes, request.format, request.quality, filename)
}

async fn compress_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file_bytes = Vec::new();
    let mut filename: Option<String> = None;
    let mut format = CompressionFormat::Webp;
    let mut quality: u8 = 80;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Malformed multipart request: {e}"),
                    None,
                    state.debug,
                );
            }
        };

        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                file_bytes = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read uploaded file: {e}"),
                            None,
                            state.debug,
                        );
                    }
                };
            }
            "format" => {
                let value = match field.text().await {
                    Ok(value) => value,
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read format field: {e}"),
                            None,
                            state.debug,
                        );
                    }
                };
                format = match value.parse::<CompressionFormat>() {
                    Ok(format) => format,
                    Err(e) => return error_response(StatusCode::BAD_REQUEST, e, None, state.debug),
                };
            }
            "quality" => {
                let value = match field.text().await {
                    Ok(value) => value,
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read quality field: {e}"),
                            None,
                            state.debug,
                        );
                    }
                };
                quality = match value.trim().parse::<u8>() {
                    Ok(quality) => quality,
                    Err(_) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Invalid quality value: {value}"),
                            None,
                            state.debug,
                        );
                    }
                };
            }
            _ => {}
        }
    }

    if file_bytes.is_empty() {
        log::error!("❌ API: upload without file data");
        return error_response(
            StatusCode::BAD_REQUEST,
            "File is empty".to_string(),
            None,
            state.debug,
        );
    }
    if !infer::is_image(&file_bytes) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "File must be an image".to_string(),
            None,
            state.debug,
        );
    }
    if !(1..=100).contains(&quality) {
        return compress_error_response(&CompressError::InvalidQuality(quality), state.debug);
    }

    let filename = normalize_filename(filename.as_deref());
    log::info!(
        "🔍 API: upload compression - file: {}, format: {}, quality: {} ({})",
        filename,
        format,
        quality,
        format_size(file_bytes.len() as u64, DECIMAL)
    );
    run_compression(&state, file_bytes, format, quality, filename)
}

fn run_compression(
    state: &AppState,
    image_bytes: Vec<u8>,
    format: CompressionFormat,
    quality: u8,
    filename: String,
) -> Response {
    let started = Instant::now();

    let result = match compressor::compress(&image_bytes, format.token(), quality, Some(&filename))
    {
        Ok(result) => result,
        Err(e) => return compress_error_response(&e, state.debug),
    };

    let stats = match stats::stats(&image_bytes, &result.bytes) {
        Ok(stats) => stats,
        Err(e) => return compress_error_response(&e, state.debug),
    };

    log::info!(
        "✅ API: compressed {} in {:?} - {} → {} ({:.2}% reduction)",
        filename,
        started.elapsed(),
        format_size(stats.original_size as u64, DECIMAL),
        format_size(stats.compressed_size as u64, DECIMAL),
        stats.reduction_percent
    );

    let body = CompressResponse {
        success: true,
        compressed_image_base64: general_purpose::STANDARD.encode(&result.bytes),
        format: result.family.token().to_string(),
        quality: result.quality,
        stats,
        filename,
        warning: result.fallback,
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn compress_error_response(err: &CompressError, debug: bool) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    log::error!("❌ API: compression failed: {}", err);
    error_response(status, user_message(err), Some(err.to_string()), debug)
}

/// Message safe to show callers; internals go to `details` in debug mode.
fn user_message(err: &CompressError) -> String {
    match err {
        CompressError::InvalidImage(_) => "Image data could not be decoded".to_string(),
        CompressError::InvalidQuality(q) => {
            format!("Invalid quality value: {q}. Must be between 1 and 100")
        }
        CompressError::CompressionFailed { family, .. } => format!("{family} compression failed"),
        CompressError::DegenerateInput => "Compression produced no output".to_string(),
    }
}

fn error_response(
    status: StatusCode,
    error: String,
    details: Option<String>,
    debug: bool,
) -> Response {
    let body = ErrorResponse {
        success: false,
        error,
        details: if debug { details } else { None },
    };
    (status, Json(body)).into_response()
}

fn strip_data_url_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        payload.split_once(',').map(|(_, rest)| rest).unwrap_or(payload)
    } else {
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn red_png() -> Vec<u8> {
        let img = ImageBuffer::from_fn(64, 64, |_, _| Rgb([255u8, 0, 0]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        assert_eq!(
            strip_data_url_prefix("data:image/png;base64,AAAA"),
            "AAAA"
        );
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("data:broken"), "data:broken");
    }

    #[tokio::test]
    async fn base64_endpoint_compresses_and_echoes_quality() {
        let request = CompressRequest {
            image_base64: general_purpose::STANDARD.encode(red_png()),
            format: CompressionFormat::Webp,
            quality: 80,
            filename: Some("red.png".to_string()),
        };
        let response = compress_base64(State(AppState { debug: false }), Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value["success"], true);
        assert_eq!(value["format"], "webp");
        assert_eq!(value["quality"], 80);
        assert_eq!(value["filename"], "red.png");
        assert!(value["stats"]["compressed_size"].as_u64().unwrap() > 0);
        assert!(value.get("warning").is_none());
    }

    #[tokio::test]
    async fn avif_request_carries_a_warning() {
        let request = CompressRequest {
            image_base64: general_purpose::STANDARD.encode(red_png()),
            format: CompressionFormat::Avif,
            quality: 80,
            filename: None,
        };
        let response = compress_base64(State(AppState { debug: false }), Json(request)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value["format"], "webp");
        assert!(value["warning"].as_str().unwrap().contains("AVIF"));
    }

    #[tokio::test]
    async fn invalid_base64_is_a_client_error() {
        let request = CompressRequest {
            image_base64: "!!!not-base64!!!".to_string(),
            format: CompressionFormat::Webp,
            quality: 80,
            filename: None,
        };
        let response = compress_base64(State(AppState { debug: false }), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = response_json(response).await;
        assert_eq!(value["success"], false);
    }

    #[tokio::test]
    async fn out_of_range_quality_is_a_client_error() {
        let request = CompressRequest {
            image_base64: general_purpose::STANDARD.encode(red_png()),
            format: CompressionFormat::Webp,
            quality: 101,
            filename: None,
        };
        let response = compress_base64(State(AppState { debug: false }), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn details_only_appear_in_debug_mode() {
        let request = CompressRequest {
            image_base64: general_purpose::STANDARD.encode(b"not an image"),
            format: CompressionFormat::Webp,
            quality: 80,
            filename: None,
        };
        let response =
            compress_base64(State(AppState { debug: false }), Json(request.clone())).await;
        let value = response_json(response).await;
        assert!(value.get("details").is_none());

        let response = compress_base64(State(AppState { debug: true }), Json(request)).await;
        let value = response_json(response).await;
        assert!(value["details"].is_string());
    }

    #[tokio::test]
    async fn formats_listing_covers_every_token() {
        let Json(listing) = supported_formats().await;
        assert_eq!(listing.formats.len(), CompressionFormat::ALL.len());
        assert!(listing.formats.contains_key("webp"));
        assert!(listing.formats.contains_key("avif"));
    }

    #[tokio::test]
    async fn health_reports_available_encoders() {
        let Json(health) = health().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.encoders, vec!["webp", "mozjpeg", "oxipng"]);
    }
}
