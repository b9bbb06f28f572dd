//! TeraBox 分享链接解析：直链、加速链接、缩略图

pub mod config;
pub mod cookies;
pub mod error;
pub mod state;
pub mod terabox;
pub mod web;

pub use config::Config;
pub use error::{ErrorKind, ResolveError};
pub use state::AppState;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
