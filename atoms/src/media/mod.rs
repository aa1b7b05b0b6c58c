// Re-export model types and service functions
pub mod compress;
pub mod model;
pub mod service;

pub use compress::{compress_image, fit_within, CompressedImage, CompressionError};
pub use model::image_path;
pub use service::*;
