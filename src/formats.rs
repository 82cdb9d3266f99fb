//! Format tokens accepted by the API and their mapping to the encoders
//! actually available in-process.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output format tokens accepted in requests.
///
/// Several tokens are aliases: `jpeg` and `jpg` select the MozJPEG encoder,
/// `png` selects OxiPNG. `avif` is accepted but has no native encoder and is
/// served via the WebP fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum CompressionFormat {
    Webp,
    Mozjpeg,
    Avif,
    Oxipng,
    Jpeg,
    Jpg,
    Png,
}

impl CompressionFormat {
    pub const ALL: [CompressionFormat; 7] = [
        CompressionFormat::Webp,
        CompressionFormat::Mozjpeg,
        CompressionFormat::Avif,
        CompressionFormat::Oxipng,
        CompressionFormat::Jpeg,
        CompressionFormat::Jpg,
        CompressionFormat::Png,
    ];

    pub fn token(self) -> &'static str {
        match self {
            CompressionFormat::Webp => "webp",
            CompressionFormat::Mozjpeg => "mozjpeg",
            CompressionFormat::Avif => "avif",
            CompressionFormat::Oxipng => "oxipng",
            CompressionFormat::Jpeg => "jpeg",
            CompressionFormat::Jpg => "jpg",
            CompressionFormat::Png => "png",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CompressionFormat::Webp => "WebP - Excellent universal compression",
            CompressionFormat::Mozjpeg => "MozJPEG - Best for photographs",
            CompressionFormat::Avif => "AVIF - No native encoder, served as WebP",
            CompressionFormat::Oxipng => "OxiPNG - PNG optimization without loss",
            CompressionFormat::Jpeg => "JPEG - Alias for mozJPEG",
            CompressionFormat::Jpg => "JPG - Alias for mozJPEG",
            CompressionFormat::Png => "PNG - Alias for oxiPNG",
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for CompressionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(CompressionFormat::Webp),
            "mozjpeg" => Ok(CompressionFormat::Mozjpeg),
            "avif" => Ok(CompressionFormat::Avif),
            "oxipng" => Ok(CompressionFormat::Oxipng),
            "jpeg" => Ok(CompressionFormat::Jpeg),
            "jpg" => Ok(CompressionFormat::Jpg),
            "png" => Ok(CompressionFormat::Png),
            other => Err(format!(
                "unsupported format '{}', expected one of: webp, mozjpeg, avif, oxipng, jpeg, jpg, png",
                other
            )),
        }
    }
}

impl TryFrom<String> for CompressionFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Encoder actually invoked after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderFamily {
    WebP,
    Jpeg,
    Png,
}

impl EncoderFamily {
    pub const ALL: [EncoderFamily; 3] =
        [EncoderFamily::WebP, EncoderFamily::Jpeg, EncoderFamily::Png];

    /// Canonical request token for the family, reported back to callers.
    pub fn token(self) -> &'static str {
        match self {
            EncoderFamily::WebP => "webp",
            EncoderFamily::Jpeg => "mozjpeg",
            EncoderFamily::Png => "oxipng",
        }
    }

    /// PNG is lossless; the requested quality is echoed but not applied.
    pub fn quality_sensitive(self) -> bool {
        !matches!(self, EncoderFamily::Png)
    }
}

impl fmt::Display for EncoderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncoderFamily::WebP => "WebP",
            EncoderFamily::Jpeg => "MozJPEG",
            EncoderFamily::Png => "OxiPNG",
        };
        write!(f, "{}", name)
    }
}

/// Result of normalizing a raw format token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFormat {
    pub family: EncoderFamily,
    /// Present when the requested format had no native encoder and another
    /// family was substituted.
    pub fallback: Option<String>,
}

/// Map a raw format token to the encoder family that will handle it.
///
/// Total and case-insensitive: every token maps to exactly one family.
/// AVIF and unrecognized tokens substitute WebP and carry a fallback note so
/// the substitution is never silent.
pub fn normalize(token: &str) -> NormalizedFormat {
    match token.to_ascii_lowercase().as_str() {
        "webp" => NormalizedFormat {
            family: EncoderFamily::WebP,
            fallback: None,
        },
        "mozjpeg" | "jpeg" | "jpg" => NormalizedFormat {
            family: EncoderFamily::Jpeg,
            fallback: None,
        },
        "oxipng" | "png" => NormalizedFormat {
            family: EncoderFamily::Png,
            fallback: None,
        },
        "avif" => NormalizedFormat {
            family: EncoderFamily::WebP,
            fallback: Some("no native AVIF encoder available, encoded as WebP instead".to_string()),
        },
        other => NormalizedFormat {
            family: EncoderFamily::WebP,
            fallback: Some(format!("unsupported format '{}', encoded as WebP instead", other)),
        },
    }
}
