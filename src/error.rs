use thiserror::Error;

use crate::formats::EncoderFamily;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("{family} encoding failed for {filename}: {reason}")]
    CompressionFailed {
        family: EncoderFamily,
        filename: String,
        reason: String,
    },

    #[error("Compression produced empty output")]
    DegenerateInput,
}

impl CompressError {
    /// True when the failure is the caller's fault (maps to 400 at the HTTP boundary).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CompressError::InvalidImage(_) | CompressError::InvalidQuality(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_flagged() {
        assert!(CompressError::InvalidImage("bad".to_string()).is_client_error());
        assert!(CompressError::InvalidQuality(0).is_client_error());
        assert!(!CompressError::DegenerateInput.is_client_error());
        assert!(
            !CompressError::CompressionFailed {
                family: EncoderFamily::Jpeg,
                filename: "image.jpg".to_string(),
                reason: "boom".to_string(),
            }
            .is_client_error()
        );
    }

    #[test]
    fn quality_error_message_names_the_range() {
        let msg = CompressError::InvalidQuality(101).to_string();
        assert!(msg.contains("101"));
        assert!(msg.contains("between 1 and 100"));
    }
}
