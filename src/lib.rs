pub mod compressor;
pub mod error;
pub mod formats;
pub mod models;
pub mod routes;
pub mod stats;

pub use compressor::{compress, CompressedResult};
pub use error::{CompressError, Result};
pub use formats::{normalize, CompressionFormat, EncoderFamily, NormalizedFormat};
pub use stats::{stats, CompressionStats};
