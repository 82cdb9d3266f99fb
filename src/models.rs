use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formats::CompressionFormat;
use crate::stats::CompressionStats;

pub const DEFAULT_FILENAME: &str = "image.jpg";

const KNOWN_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".webp", ".bmp", ".tiff"];

/// Body of `POST /compress/base64`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompressRequest {
    /// Image payload, optionally with a `data:` URL prefix.
    pub image_base64: String,
    #[serde(default = "default_format")]
    pub format: CompressionFormat,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub filename: Option<String>,
}

fn default_format() -> CompressionFormat {
    CompressionFormat::Webp
}

fn default_quality() -> u8 {
    80
}

/// Successful response shared by both compress endpoints.
#[derive(Debug, Serialize)]
pub struct CompressResponse {
    pub success: bool,
    pub compressed_image_base64: String,
    /// Token of the encoder family actually used.
    pub format: String,
    /// Requested quality, echoed verbatim.
    pub quality: u8,
    pub stats: CompressionStats,
    pub filename: String,
    /// Present when the requested format was served by a substitute encoder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Internal error text, only populated in debug mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub encoders: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub formats: BTreeMap<&'static str, &'static str>,
}

/// Ensure the echoed filename carries a recognizable image extension.
/// The filename is diagnostic only; it never influences encoding.
pub fn normalize_filename(filename: Option<&str>) -> String {
    match filename {
        None => DEFAULT_FILENAME.to_string(),
        Some("") => DEFAULT_FILENAME.to_string(),
        Some(name) => {
            let lower = name.to_ascii_lowercase();
            if KNOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                name.to_string()
            } else {
                format!("{name}.jpg")
            }
        }
    }
}
