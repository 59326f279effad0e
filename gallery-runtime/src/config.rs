//! # Config 模块
//!
//! 角色记录与精灵配置的解析。
//!
//! ## 记录格式
//!
//! 精灵配置是一行 8 个以空白分隔的字段：
//!
//! ```text
//! characterFolder characterAction imageFileName fileExtension totalSize posX posY scale
//! Knight Idle knight_idle_ .png 8 350 350 2
//! ```
//!
//! 角色记录有两种形式：
//!
//! - 结构化 JSON：`{ detail: {...}, idleConfig, attackConfig, walkConfig, deathConfig }`
//! - 固定 9 行文本：name、health、atk、def、description，随后四行精灵配置文件引用
//!
//! 两种形式中的四个 config 字段都是**文件引用**，由 Host 读取后解析为 [`SpriteConfig`]，
//! 最终组装成 [`UnitDescriptor`]。

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// 单个动作片段允许的最大帧数
pub const MAX_FRAMES: usize = 4096;

/// 精灵配置（一个动作的帧序列描述）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    /// 角色资源目录
    pub character_folder: String,
    /// 动作子目录
    pub character_action: String,
    /// 帧文件名前缀（帧序号从 1 开始拼接在其后）
    pub image_file_name: String,
    /// 帧文件扩展名（含 `.`）
    pub file_extension: String,
    /// 帧数
    pub total_size: usize,
    /// 默认位置 X
    pub pos_x: f32,
    /// 默认位置 Y
    pub pos_y: f32,
    /// 缩放
    pub scale: f32,
}

impl SpriteConfig {
    /// 解析单行精灵配置
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let mut fields = line.split_whitespace();
        let mut next = |field: &'static str| fields.next().ok_or(ParseError::MissingField { field });

        Ok(Self {
            character_folder: next("characterFolder")?.to_string(),
            character_action: next("characterAction")?.to_string(),
            image_file_name: next("imageFileName")?.to_string(),
            file_extension: next("fileExtension")?.to_string(),
            total_size: parse_frame_count(next("totalSize")?)?,
            pos_x: parse_number("posX", next("posX")?)?,
            pos_y: parse_number("posY", next("posY")?)?,
            scale: parse_number("scale", next("scale")?)?,
        })
    }

    /// 第 `index` 帧（从 0 开始）的资源逻辑路径
    ///
    /// 形如 `{characterFolder}/{characterAction}/{imageFileName}{index + 1}{fileExtension}`。
    pub fn frame_path(&self, index: usize) -> String {
        format!(
            "{}/{}/{}{}{}",
            self.character_folder,
            self.character_action,
            self.image_file_name,
            index + 1,
            self.file_extension
        )
    }
}

/// 角色基础信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDetail {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub health: f32,
    pub atk: f32,
    pub def: f32,
}

/// 持久化的角色记录（精灵配置仍是文件引用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub detail: UnitDetail,
    pub idle_config: String,
    pub attack_config: String,
    pub walk_config: String,
    pub death_config: String,
}

impl UnitRecord {
    /// 文本记录的固定行数
    pub const TEXT_LINES: usize = 9;

    /// 解析结构化 JSON 记录
    pub fn parse_json(content: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 解析固定 9 行文本记录
    ///
    /// 同时接受 `\r\n` 与 `\n` 换行。
    pub fn parse_text(content: &str) -> Result<Self, ParseError> {
        let lines: Vec<&str> = content.lines().map(str::trim_end).collect();
        if lines.len() < Self::TEXT_LINES {
            return Err(ParseError::TooFewLines {
                expected: Self::TEXT_LINES,
                found: lines.len(),
            });
        }

        let name = non_empty("name", lines[0])?;
        Ok(Self {
            detail: UnitDetail {
                name,
                health: parse_number("health", lines[1])?,
                atk: parse_number("atk", lines[2])?,
                def: parse_number("def", lines[3])?,
                description: lines[4].to_string(),
            },
            idle_config: non_empty("idleConfig", lines[5])?,
            attack_config: non_empty("attackConfig", lines[6])?,
            walk_config: non_empty("walkConfig", lines[7])?,
            death_config: non_empty("deathConfig", lines[8])?,
        })
    }

    /// 通过 `load` 把四个文件引用解析为精灵配置
    pub fn resolve<E>(
        self,
        mut load: impl FnMut(&str) -> Result<SpriteConfig, E>,
    ) -> Result<UnitDescriptor, E> {
        Ok(UnitDescriptor {
            idle_config: load(&self.idle_config)?,
            attack_config: load(&self.attack_config)?,
            walk_config: load(&self.walk_config)?,
            death_config: load(&self.death_config)?,
            detail: self.detail,
        })
    }
}

/// 角色描述（名册查询返回的形状）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDescriptor {
    pub detail: UnitDetail,
    pub idle_config: SpriteConfig,
    pub attack_config: SpriteConfig,
    pub walk_config: SpriteConfig,
    pub death_config: SpriteConfig,
}

fn parse_number<T>(field: &'static str, value: &str) -> Result<T, ParseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
            message: e.to_string(),
        })
}

fn parse_frame_count(value: &str) -> Result<usize, ParseError> {
    let count = parse_number("totalSize", value)?;
    if count > MAX_FRAMES {
        return Err(ParseError::TooManyFrames {
            count,
            max: MAX_FRAMES,
        });
    }
    Ok(count)
}

fn non_empty(field: &'static str, value: &str) -> Result<String, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::MissingField { field });
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sprite_line() {
        let cfg = SpriteConfig::parse_line("Knight Idle knight_idle_ .png 8 350 350 2\n").unwrap();
        assert_eq!(cfg.character_folder, "Knight");
        assert_eq!(cfg.character_action, "Idle");
        assert_eq!(cfg.total_size, 8);
        assert_eq!(cfg.pos_x, 350.0);
        assert_eq!(cfg.scale, 2.0);
        assert_eq!(cfg.frame_path(0), "Knight/Idle/knight_idle_1.png");
        assert_eq!(cfg.frame_path(7), "Knight/Idle/knight_idle_8.png");
    }

    #[test]
    fn test_parse_sprite_line_errors() {
        let err = SpriteConfig::parse_line("Knight Idle knight_idle_ .png").unwrap_err();
        assert_eq!(err, ParseError::MissingField { field: "totalSize" });

        let err = SpriteConfig::parse_line("Knight Idle k_ .png eight 0 0 1").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidNumber {
                field: "totalSize",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_sprite_line_rejects_huge_frame_count() {
        let line = format!("K Idle k_ .png {} 0 0 1", usize::MAX);
        let err = SpriteConfig::parse_line(&line).unwrap_err();
        assert_eq!(
            err,
            ParseError::TooManyFrames {
                count: usize::MAX,
                max: MAX_FRAMES
            }
        );

        let line = format!("K Idle k_ .png {} 0 0 1", MAX_FRAMES + 1);
        assert!(matches!(
            SpriteConfig::parse_line(&line),
            Err(ParseError::TooManyFrames { .. })
        ));

        let line = format!("K Idle k_ .png {MAX_FRAMES} 0 0 1");
        assert_eq!(SpriteConfig::parse_line(&line).unwrap().total_size, MAX_FRAMES);
    }

    #[test]
    fn test_parse_text_record() {
        let text = "Alpha\r\n100\r\n12\r\n4\r\nA brave knight\r\nidle.txt\r\nattack.txt\r\nwalk.txt\r\ndeath.txt";
        let record = UnitRecord::parse_text(text).unwrap();
        insta::assert_debug_snapshot!(record, @r#"
        UnitRecord {
            detail: UnitDetail {
                name: "Alpha",
                description: "A brave knight",
                health: 100.0,
                atk: 12.0,
                def: 4.0,
            },
            idle_config: "idle.txt",
            attack_config: "attack.txt",
            walk_config: "walk.txt",
            death_config: "death.txt",
        }
        "#);
    }

    #[test]
    fn test_parse_text_record_errors() {
        let err = UnitRecord::parse_text("Alpha\n100\n12").unwrap_err();
        assert_eq!(
            err,
            ParseError::TooFewLines {
                expected: 9,
                found: 3
            }
        );

        let err = UnitRecord::parse_text("Alpha\nlots\n1\n1\nd\na\nb\nc\nd").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidNumber {
                field: "health",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_json_record() {
        let json = r#"{
            "detail": { "name": "Bravo", "description": "Archer", "health": 80, "atk": 9, "def": 2 },
            "idleConfig": "bravo_idle.txt",
            "attackConfig": "bravo_attack.txt",
            "walkConfig": "bravo_walk.txt",
            "deathConfig": "bravo_death.txt"
        }"#;
        let record = UnitRecord::parse_json(json).unwrap();
        assert_eq!(record.detail.name, "Bravo");
        assert_eq!(record.detail.health, 80.0);
        assert_eq!(record.death_config, "bravo_death.txt");

        assert!(UnitRecord::parse_json(r#"{ "detail": {} }"#).is_err());
    }

    #[test]
    fn test_resolve_references() {
        let text = "Alpha\n100\n12\n4\n\nidle.txt\nattack.txt\nwalk.txt\ndeath.txt";
        let record = UnitRecord::parse_text(text).unwrap();

        let mut seen = Vec::new();
        let descriptor = record
            .resolve(|reference| {
                seen.push(reference.to_string());
                let action = reference.trim_end_matches(".txt");
                SpriteConfig::parse_line(&format!("Alpha {action} {action}_ .png 3 0 0 1"))
            })
            .unwrap();
        assert_eq!(seen, ["idle.txt", "attack.txt", "walk.txt", "death.txt"]);
        assert_eq!(descriptor.walk_config.character_action, "walk");
        assert_eq!(descriptor.detail.description, "");

        let record = UnitRecord::parse_text(text).unwrap();
        let err = record
            .resolve(|_| Err::<SpriteConfig, _>(ParseError::MissingField { field: "x" }))
            .unwrap_err();
        assert_eq!(err, ParseError::MissingField { field: "x" });
    }

    #[test]
    fn test_descriptor_wire_format() {
        let cfg = SpriteConfig::parse_line("Knight Idle k_ .png 2 10 20 1").unwrap();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["characterFolder"], "Knight");
        assert_eq!(json["totalSize"], 2);
        assert_eq!(json["posY"], 20.0);
    }
}
