//! # 路径规范化模块
//!
//! 资源加载统一使用**相对于资源根目录的逻辑路径**：
//!
//! - 使用 `/` 作为分隔符
//! - 不带 `assets/` 前缀
//! - 来自外部请求的路径段必须先经过 [`resolve_asset_path`] 校验

use std::path::{Path, PathBuf};

use super::ResourceError;

/// 规范化逻辑路径
///
/// 统一分隔符，去掉空段与 `.`，`..` 回退一级（不会越过开头），并移除 `assets/` 前缀。
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");

    let mut components = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    let result = components.join("/");
    match result.strip_prefix("assets/") {
        Some(rest) => rest.to_string(),
        None => result,
    }
}

/// 校验单个外部路径段
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
        && !Path::new(segment).is_absolute()
}

/// 把外部请求的路径段拼接到资源根目录下
///
/// 任何段为空、为 `.`/`..`、包含分隔符或为绝对路径时返回 [`ResourceError::Forbidden`]，
/// 拼接结果不存在时返回 [`ResourceError::NotFound`]。
pub fn resolve_asset_path(root: &Path, segments: &[&str]) -> Result<PathBuf, ResourceError> {
    if segments.is_empty() || !segments.iter().all(|s| is_safe_segment(s)) {
        return Err(ResourceError::Forbidden {
            path: segments.join("/"),
        });
    }

    let full = segments.iter().fold(root.to_path_buf(), |acc, s| acc.join(s));
    if !full.is_file() {
        return Err(ResourceError::NotFound {
            path: segments.join("/"),
        });
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_logical_path() {
        assert_eq!(normalize_logical_path("Knight\\Idle\\k1.png"), "Knight/Idle/k1.png");
        assert_eq!(normalize_logical_path("./HealthBar/HealthBar.png"), "HealthBar/HealthBar.png");
        assert_eq!(normalize_logical_path("a/../b//c.png"), "b/c.png");
        assert_eq!(normalize_logical_path("../../x.png"), "x.png");
        assert_eq!(normalize_logical_path("assets/Knight/k.png"), "Knight/k.png");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/nonexistent-root");
        for bad in [
            vec![".."],
            vec!["Knight", ".."],
            vec!["..", "secret.txt"],
            vec!["Knight", ""],
            vec!["a/b", "c.png"],
            vec!["a\\b", "c.png"],
            vec!["/etc", "passwd"],
        ] {
            assert!(
                matches!(
                    resolve_asset_path(root, &bad),
                    Err(ResourceError::Forbidden { .. })
                ),
                "{bad:?} 应被拒绝"
            );
        }
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = std::env::temp_dir();
        let result = resolve_asset_path(&dir, &["no-such-dir-for-gallery", "nope.png"]);
        assert!(matches!(result, Err(ResourceError::NotFound { .. })));
    }
}
