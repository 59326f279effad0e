//! # Resources 模块
//!
//! 资源来源抽象、路径规范化与外部路径校验。

mod error;
pub mod path;
mod source;

pub use error::ResourceError;
pub use path::{normalize_logical_path, resolve_asset_path};
pub use source::{FsSource, ResourceSource};
