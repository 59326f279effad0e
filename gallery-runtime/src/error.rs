//! # Error 模块
//!
//! 定义 gallery-runtime 中使用的错误类型。
//!
//! 错误按影响范围划分：记录解析失败只影响单条记录，
//! 说话者查找失败只影响当前对话会话，均不会升级为全局错误。

use thiserror::Error;

/// 配置记录解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 缺少必需字段
    #[error("记录缺少字段 '{field}'")]
    MissingField { field: &'static str },

    /// 数值字段无法解析
    #[error("字段 '{field}' 的值 '{value}' 无效 - {message}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        message: String,
    },

    /// 文本记录行数不足
    #[error("文本记录需要 {expected} 行，实际只有 {found} 行")]
    TooFewLines { expected: usize, found: usize },

    /// 帧数超过上限
    #[error("帧数 {count} 超过上限 {max}")]
    TooManyFrames { count: usize, max: usize },

    /// JSON 结构无效
    #[error("无效的 JSON 记录: {message}")]
    InvalidJson { message: String },
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::InvalidJson {
            message: e.to_string(),
        }
    }
}

/// 对话播放错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogueError {
    /// 台词的说话者不在角色名册中
    #[error("说话者 '{speaker}' 不在角色名册中")]
    SpeakerNotFound { speaker: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ParseError::MissingField { field: "name" };
        assert_eq!(err.to_string(), "记录缺少字段 'name'");

        let err = DialogueError::SpeakerNotFound {
            speaker: "Ghost".to_string(),
        };
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ParseError = json_err.into();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }
}
