//! # Resource Source 模块
//!
//! 资源来源抽象层。所有路径参数都是**逻辑路径**（见 [`super::path`]）。

use std::path::{Path, PathBuf};

use super::ResourceError;
use super::path::normalize_logical_path;

/// 资源来源 trait
///
/// 加载线程池跨线程共享同一个来源，因此要求 `Send + Sync`。
pub trait ResourceSource: Send + Sync {
    /// 读取资源字节
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;

    /// 获取资源的完整路径（用于调试/日志）
    fn full_path(&self, path: &str) -> String;

    /// 列出目录下的所有文件（逻辑路径，按名称排序）
    fn list_files(&self, dir_path: &str) -> Vec<String>;
}

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsSource {
    base_path: PathBuf,
}

impl FsSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, logical_path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(logical_path))
    }
}

impl ResourceSource for FsSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full_path = self.resolve(path);
        std::fs::read(&full_path)
            .map_err(|e| ResourceError::from_io(full_path.to_string_lossy(), "file", e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn full_path(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().to_string()
    }

    fn list_files(&self, dir_path: &str) -> Vec<String> {
        let full_dir = self.resolve(dir_path);

        let mut files = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&full_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&self.base_path) {
                    files.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        files
    }
}
