//! # Gallery Host
//!
//! 角色图鉴的宿主层。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 数据目录扫描（角色记录、精灵配置、台词库）
//! - 图像读取与解码（固定线程池）
//! - 只读 HTTP 资源服务（`server` feature）
//!
//! 选择、动画与对话的全部逻辑都在 `gallery-runtime` 中，Host 只负责把数据和帧交给它。

pub mod app;
pub mod assets;
pub mod config;
pub mod data;
pub mod resources;
#[cfg(feature = "server")]
pub mod server;

pub use app::{HostError, LoadedGallery, load_gallery, load_gallery_data};
pub use assets::{AssetLoader, AssetRequest, AssetTarget, HEALTH_BAR_PATH, LoadStatus, LoadedAsset};
pub use config::{AppConfig, CanvasConfig, ConfigError, LoadingConfig, ServerConfig};
pub use data::{DataError, GalleryData, load_data};
pub use resources::{FsSource, ResourceError, ResourceSource};
