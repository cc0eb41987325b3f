pub mod config;
pub mod image;
pub mod models;
pub mod presenter;
pub mod profile;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use presenter::Verdict;
pub use utils::error::ClassifyError;

pub type Result<T> = std::result::Result<T, ClassifyError>;
