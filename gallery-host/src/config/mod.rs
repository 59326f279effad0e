//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use gallery_runtime::Canvas;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 图像资源根目录（帧与血条皮肤）
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 角色记录与台词所在目录
    ///
    /// 兼容旧配置中的 `assets` 键。
    #[serde(default = "default_data_dir", alias = "assets")]
    pub data_dir: PathBuf,

    /// 逻辑画布
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// 资源加载
    #[serde(default)]
    pub loading: LoadingConfig,

    /// HTTP 服务
    #[serde(default)]
    pub server: ServerConfig,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 画布配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_canvas_width")]
    pub width: f32,

    #[serde(default = "default_canvas_height")]
    pub height: f32,
}

/// 加载配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// 解码线程数
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

// 默认值函数
fn default_assets_root() -> PathBuf {
    PathBuf::from("public/assets")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_canvas_width() -> f32 {
    1280.0
}

fn default_canvas_height() -> f32 {
    720.0
}

fn default_workers() -> usize {
    4
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            data_dir: default_data_dir(),
            canvas: CanvasConfig::default(),
            loading: LoadingConfig::default(),
            server: ServerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl CanvasConfig {
    pub fn to_canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }
}

impl AppConfig {
    /// 读取并解析配置文件
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// 加载配置文件
    ///
    /// 文件不存在或解析失败时返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(error = %e, "使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.data_dir.is_dir() {
            return Err(ConfigError::ValidationFailed(format!(
                "数据目录不存在: {:?}",
                self.data_dir
            )));
        }

        if !self.assets_root.is_dir() {
            return Err(ConfigError::ValidationFailed(format!(
                "资源目录不存在: {:?}",
                self.assets_root
            )));
        }

        if self.canvas.width <= 0.0 || self.canvas.height <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "画布尺寸必须大于 0".to_string(),
            ));
        }

        if self.loading.workers == 0 {
            return Err(ConfigError::ValidationFailed(
                "loading.workers 至少为 1".to_string(),
            ));
        }

        Ok(())
    }

    /// 服务监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 配置错误
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// 解析失败
    #[error("配置解析失败: {0}")]
    ParseFailed(String),
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
