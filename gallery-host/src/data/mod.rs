//! # Data 模块
//!
//! 扫描数据目录，读取角色记录与台词库。
//!
//! ## 文件约定
//!
//! ```text
//! Unit_*.json      结构化角色记录
//! Unit_*.txt       9 行文本角色记录
//! Dialogue_*.json  单个角色的台词库，角色名取 `_` 与扩展名之间的部分
//! ```
//!
//! 记录中的精灵配置引用相对于数据目录解析。任何一个文件出错只跳过该文件并记录警告。

use gallery_runtime::{
    DialogueBank, ParseError, SpriteConfig, UnitDescriptor, UnitDialogue, UnitRecord,
    dialogue_owner_from_file_name,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::resources::{ResourceError, ResourceSource};

const UNIT_PREFIX: &str = "Unit_";
const DIALOGUE_PREFIX: &str = "Dialogue_";

/// 单个数据文件的加载错误
#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("无法从文件名确定角色: {path}")]
    UnknownOwner { path: String },
}

/// 数据目录的全部内容
#[derive(Debug, Clone, Default)]
pub struct GalleryData {
    /// 角色描述，按记录文件名排序
    pub units: Vec<UnitDescriptor>,
    pub dialogue: DialogueBank,
}

/// 扫描数据来源的根目录
pub fn load_data(source: &dyn ResourceSource) -> GalleryData {
    let mut data = GalleryData::default();

    for path in source.list_files("") {
        let file_name = path.rsplit('/').next().unwrap_or(&path);

        if file_name.starts_with(UNIT_PREFIX) {
            match load_unit(source, &path) {
                Ok(Some(unit)) => data.units.push(unit),
                Ok(None) => debug!(path = %path, "忽略非记录格式的文件"),
                Err(e) => warn!(path = %path, error = %e, "角色记录加载失败，已跳过"),
            }
        } else if file_name.starts_with(DIALOGUE_PREFIX) && file_name.ends_with(".json") {
            match load_dialogue(source, &path, file_name) {
                Ok((owner, dialogue)) => data.dialogue.insert(owner, dialogue),
                Err(e) => warn!(path = %path, error = %e, "台词文件加载失败，已跳过"),
            }
        }
    }

    info!(
        units = data.units.len(),
        dialogue = data.dialogue.len(),
        "数据加载完成"
    );
    data
}

/// 读取一个角色记录并解析它引用的四个精灵配置
///
/// 扩展名既不是 `.json` 也不是 `.txt` 时返回 `Ok(None)`。
pub fn load_unit(
    source: &dyn ResourceSource,
    path: &str,
) -> Result<Option<UnitDescriptor>, DataError> {
    let content = read_text(source, path)?;
    let record = if path.ends_with(".json") {
        UnitRecord::parse_json(&content)
    } else if path.ends_with(".txt") {
        UnitRecord::parse_text(&content)
    } else {
        return Ok(None);
    }
    .map_err(|source| DataError::Parse {
        path: path.to_string(),
        source,
    })?;

    let base = parent_dir(path);
    let descriptor = record.resolve(|reference| {
        let sprite_path = join_logical(base, reference);
        let line = read_text(source, &sprite_path)?;
        SpriteConfig::parse_line(&line).map_err(|source| DataError::Parse {
            path: sprite_path,
            source,
        })
    })?;
    Ok(Some(descriptor))
}

fn load_dialogue(
    source: &dyn ResourceSource,
    path: &str,
    file_name: &str,
) -> Result<(String, UnitDialogue), DataError> {
    let owner = dialogue_owner_from_file_name(file_name).ok_or_else(|| DataError::UnknownOwner {
        path: path.to_string(),
    })?;
    let content = read_text(source, path)?;
    let dialogue = UnitDialogue::from_json(&content).map_err(|source| DataError::Parse {
        path: path.to_string(),
        source,
    })?;
    Ok((owner.to_string(), dialogue))
}

fn read_text(source: &dyn ResourceSource, path: &str) -> Result<String, ResourceError> {
    let bytes = source.read(path)?;
    String::from_utf8(bytes).map_err(|e| ResourceError::InvalidFormat {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn join_logical(base: &str, reference: &str) -> String {
    if base.is_empty() {
        reference.to_string()
    } else {
        format!("{base}/{reference}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::FsSource;
    use std::fs;

    fn write(dir: &std::path::Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn write_sprites(dir: &std::path::Path, unit: &str) {
        for action in ["Idle", "Attack", "Walk", "Death"] {
            write(
                dir,
                &format!("{unit}_{action}.txt"),
                &format!("{unit} {action} {}_ .png 2 100 200 1", action.to_lowercase()),
            );
        }
    }

    #[test]
    fn test_scan_mixed_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_sprites(dir.path(), "Alpha");
        write_sprites(dir.path(), "Bravo");
        write(
            dir.path(),
            "Unit_Bravo.txt",
            "Bravo\r\n80\r\n9\r\n2\r\nArcher\r\nBravo_Idle.txt\r\nBravo_Attack.txt\r\nBravo_Walk.txt\r\nBravo_Death.txt",
        );
        write(
            dir.path(),
            "Unit_Alpha.json",
            r#"{
                "detail": { "name": "Alpha", "health": 100, "atk": 12, "def": 4 },
                "idleConfig": "Alpha_Idle.txt",
                "attackConfig": "Alpha_Attack.txt",
                "walkConfig": "Alpha_Walk.txt",
                "deathConfig": "Alpha_Death.txt"
            }"#,
        );
        write(
            dir.path(),
            "Dialogue_Alpha.json",
            r#"{ "normal": [{ "speaker": "Alpha", "line": "Ready." }] }"#,
        );
        write(dir.path(), "notes.md", "ignored");

        let data = load_data(&FsSource::new(dir.path()));
        let names: Vec<&str> = data.units.iter().map(|u| u.detail.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo"]);
        assert_eq!(data.units[1].idle_config.character_action, "Idle");
        assert_eq!(data.units[1].detail.description, "Archer");
        assert_eq!(data.dialogue.len(), 1);
        assert_eq!(data.dialogue.get("Alpha").unwrap().normal[0].line, "Ready.");
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_sprites(dir.path(), "Alpha");
        write(dir.path(), "Unit_Broken.json", "{ nope");
        write(
            dir.path(),
            "Unit_MissingSprite.txt",
            "Ghost\n1\n1\n1\n\nGhost_Idle.txt\nGhost_Attack.txt\nGhost_Walk.txt\nGhost_Death.txt",
        );
        write(
            dir.path(),
            "Unit_Alpha.txt",
            "Alpha\n100\n1\n1\n\nAlpha_Idle.txt\nAlpha_Attack.txt\nAlpha_Walk.txt\nAlpha_Death.txt",
        );
        write(dir.path(), "Dialogue_Alpha.json", "42");

        write_sprites(dir.path(), "Huge");
        write(
            dir.path(),
            "Huge_Walk.txt",
            "Huge Walk walk_ .png 18446744073709551615 0 0 1",
        );
        write(
            dir.path(),
            "Unit_Huge.txt",
            "Huge\n1\n1\n1\n\nHuge_Idle.txt\nHuge_Attack.txt\nHuge_Walk.txt\nHuge_Death.txt",
        );

        let data = load_data(&FsSource::new(dir.path()));
        assert_eq!(data.units.len(), 1);
        assert_eq!(data.units[0].detail.name, "Alpha");
        assert!(data.dialogue.is_empty());
    }

    #[test]
    fn test_load_unit_rejects_huge_frame_count() {
        let dir = tempfile::tempdir().unwrap();
        write_sprites(dir.path(), "Huge");
        write(
            dir.path(),
            "Huge_Death.txt",
            "Huge Death death_ .png 99999999 0 0 1",
        );
        write(
            dir.path(),
            "Unit_Huge.txt",
            "Huge\n1\n1\n1\n\nHuge_Idle.txt\nHuge_Attack.txt\nHuge_Walk.txt\nHuge_Death.txt",
        );
        let err = load_unit(&FsSource::new(dir.path()), "Unit_Huge.txt").unwrap_err();
        assert!(matches!(
            err,
            DataError::Parse {
                source: ParseError::TooManyFrames { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_load_unit_reports_missing_sprite() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Unit_Ghost.txt",
            "Ghost\n1\n1\n1\n\nGhost_Idle.txt\nGhost_Attack.txt\nGhost_Walk.txt\nGhost_Death.txt",
        );
        let err = load_unit(&FsSource::new(dir.path()), "Unit_Ghost.txt").unwrap_err();
        assert!(matches!(
            err,
            DataError::Resource(ResourceError::NotFound { .. })
        ));
    }
}
