//! In-process image recompression: decode once, normalize the requested
//! format, encode with the matching native codec.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use oxipng::{optimize_from_memory, Options as OxipngOptions};
use webp::{Encoder as WebpEncoder, WebPConfig};

use crate::error::{CompressError, Result};
use crate::formats::{normalize, EncoderFamily};

/// Output of a single compression call.
#[derive(Debug, Clone)]
pub struct CompressedResult {
    pub bytes: Vec<u8>,
    /// Encoder family actually used after normalization.
    pub family: EncoderFamily,
    /// Requested quality, echoed verbatim (PNG ignores it).
    pub quality: u8,
    /// Set when the requested format had no native encoder and WebP was
    /// substituted.
    pub fallback: Option<String>,
}

/// Re-encode `input` into the format named by `format_token`.
///
/// Quality is validated before anything else; undecodable or empty input is
/// rejected before any encode attempt. The token is normalized
/// case-insensitively to one of the WebP / MozJPEG / OxiPNG encoders, with
/// WebP substituted (and flagged in the result) for AVIF and unrecognized
/// tokens. Images with an alpha channel are flattened onto white before JPEG
/// encoding. All scratch state is in-memory and request-scoped.
pub fn compress(
    input: &[u8],
    format_token: &str,
    quality: u8,
    filename_hint: Option<&str>,
) -> Result<CompressedResult> {
    if !(1..=100).contains(&quality) {
        return Err(CompressError::InvalidQuality(quality));
    }
    if input.is_empty() {
        return Err(CompressError::InvalidImage("empty input".to_string()));
    }

    // Only used for diagnostics, never for encoding decisions.
    let filename = filename_hint.unwrap_or("image");

    let img = image::load_from_memory(input)
        .map_err(|e| CompressError::InvalidImage(e.to_string()))?;

    let normalized = normalize(format_token);
    if let Some(reason) = &normalized.fallback {
        log::warn!("⚠️ {}: {}", filename, reason);
    }

    let bytes = match normalized.family {
        EncoderFamily::WebP => encode_webp(&img, quality, filename)?,
        EncoderFamily::Jpeg => encode_jpeg(&img, quality, filename)?,
        EncoderFamily::Png => encode_png(&img, filename)?,
    };

    if bytes.is_empty() {
        return Err(CompressError::DegenerateInput);
    }

    Ok(CompressedResult {
        bytes,
        family: normalized.family,
        quality,
        fallback: normalized.fallback,
    })
}

/// WebP via the webp crate, lossy at the given quality.
fn encode_webp(img: &DynamicImage, quality: u8, filename: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| CompressError::CompressionFailed {
        family: EncoderFamily::WebP,
        filename: filename.to_string(),
        reason,
    };

    let rgba = img.to_rgba8();
    let encoder = WebpEncoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());

    let mut config =
        WebPConfig::new().map_err(|_| fail("failed to create WebP config".to_string()))?;
    config.quality = quality as f32;
    config.method = 6; // slowest, best compression

    let encoded = encoder
        .encode_advanced(&config)
        .map_err(|e| fail(format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

/// JPEG via mozjpeg: progressive with optimized entropy coding. Images with
/// an alpha channel are flattened onto white first (JPEG has no alpha).
fn encode_jpeg(img: &DynamicImage, quality: u8, filename: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| CompressError::CompressionFailed {
        family: EncoderFamily::Jpeg,
        filename: filename.to_string(),
        reason,
    };

    let rgb = if img.color().has_alpha() {
        flatten_onto_white(img)
    } else {
        img.to_rgb8()
    };
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(w, h);
    comp.set_quality(quality as f32);
    comp.set_progressive_mode();
    comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
    comp.set_optimize_coding(true);

    let mut dest = Vec::new();
    let mut writer = comp
        .start_compress(&mut dest)
        .map_err(|e| fail(e.to_string()))?;
    writer
        .write_scanlines(rgb.as_raw())
        .map_err(|e| fail(e.to_string()))?;
    writer.finish().map_err(|e| fail(e.to_string()))?;

    Ok(dest)
}

/// Lossless PNG: re-encode via the image crate, then run oxipng optimization.
/// Quality does not apply.
fn encode_png(img: &DynamicImage, filename: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| CompressError::CompressionFailed {
        family: EncoderFamily::Png,
        filename: filename.to_string(),
        reason,
    };

    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| fail(e.to_string()))?;

    let mut opts = OxipngOptions::from_preset(6);
    opts.strip = oxipng::StripChunks::Safe;
    opts.optimize_alpha = true;
    optimize_from_memory(&cursor.into_inner(), &opts).map_err(|e| fail(e.to_string()))
}

/// Alpha-composite onto an opaque white background.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
        *dst = Rgb([blend(src[0]), blend(src[1]), blend(src[2])]);
    }
    rgb
}
