//! # Resource Error 模块
//!
//! 定义资源访问相关的错误类型。

use thiserror::Error;

/// 资源访问错误
#[derive(Error, Debug)]
pub enum ResourceError {
    /// 资源加载失败
    #[error("加载 {kind} 资源失败: {path} - {message}")]
    LoadFailed {
        /// 资源路径
        path: String,
        /// 资源类型（file, image 等）
        kind: String,
        /// 错误消息
        message: String,
    },

    /// 资源未找到
    #[error("资源未找到: {path}")]
    NotFound {
        /// 资源路径
        path: String,
    },

    /// 路径越出资源根目录
    #[error("禁止访问的资源路径: {path}")]
    Forbidden {
        /// 请求的路径
        path: String,
    },

    /// 无效的资源格式
    #[error("无效的资源格式: {path} - {message}")]
    InvalidFormat {
        /// 资源路径
        path: String,
        /// 错误消息
        message: String,
    },
}

impl ResourceError {
    /// 按 IO 错误类型区分"不存在"与其他读取失败
    pub fn from_io(path: impl Into<String>, kind: &str, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            ResourceError::NotFound { path }
        } else {
            ResourceError::LoadFailed {
                path,
                kind: kind.to_string(),
                message: err.to_string(),
            }
        }
    }
}
