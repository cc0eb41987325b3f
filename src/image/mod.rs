pub mod loader;
pub mod preprocessing;

pub use loader::{ImageLoader, ImageSummary};
pub use preprocessing::ImagePreprocessor;
