//! # Dialogue 模块
//!
//! 根据选择槽的占用挑选台词，并按固定节奏逐句播放。
//!
//! ## 触发规则
//!
//! ```text
//! 两槽都有角色 A、B -> 互相指名的嘲讽（A 对 B、B 对 A 都存在时）
//!                      否则各自随机一句无目标嘲讽，按 A、B 顺序
//! 只有一个角色     -> 该角色随机一句普通台词
//! 两槽皆空         -> 结束正在播放的会话
//! ```
//!
//! 新会话开始前总是先结束旧会话，不排队、不交错。
//!
//! ## 播放
//!
//! 每句台词停留超过 [`LINE_DWELL`] 后切到下一句，全部播完即结束会话。
//! 说话者不在名册中时中止整个会话；空白台词被跳过。

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{DialogueError, ParseError};
use crate::roster::{Roster, UnitId};
use crate::selection::{SelectionListener, SelectionPair};
use crate::unit::Position;

/// 每句台词的停留时长
pub const LINE_DWELL: Duration = Duration::from_millis(3000);

/// 一句台词
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// 说话者（角色名）
    #[serde(default)]
    pub speaker: String,
    /// 台词文本
    #[serde(default)]
    pub line: String,
    /// 指名对象（仅嘲讽台词使用），空白视为无目标
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|t| !t.trim().is_empty()))
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            line: line.into(),
            to: None,
        }
    }

    /// 设置指名对象
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.to = Some(target.into());
        self
    }

    /// 是否为无目标台词
    pub fn is_generic(&self) -> bool {
        self.to.as_deref().is_none_or(|t| t.trim().is_empty())
    }

    /// 文本非空白才可播放
    pub fn is_valid(&self) -> bool {
        !self.line.trim().is_empty()
    }
}

/// 单个角色的台词库
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitDialogue {
    #[serde(default)]
    pub normal: Vec<DialogueLine>,
    #[serde(default)]
    pub taunt: Vec<DialogueLine>,
}

impl UnitDialogue {
    pub fn from_json(content: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 第一句指名 `target` 的嘲讽
    pub fn taunt_targeting(&self, target: &str) -> Option<&DialogueLine> {
        self.taunt.iter().find(|l| l.to.as_deref() == Some(target))
    }
}

/// 台词库（角色名 -> 台词），加载后只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueBank {
    entries: BTreeMap<String, UnitDialogue>,
}

impl DialogueBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 `{ 角色名: { normal, taunt } }` 形式的完整台词库
    pub fn from_json(content: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, dialogue: UnitDialogue) {
        self.entries.insert(name.into(), dialogue);
    }

    pub fn get(&self, name: &str) -> Option<&UnitDialogue> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 从台词文件名取出所属角色名
///
/// `Dialogue_Alpha.json` -> `Alpha`：取第一个 `_` 之后、第一个 `.` 之前的部分。
pub fn dialogue_owner_from_file_name(file_name: &str) -> Option<&str> {
    let start = file_name.find('_')? + 1;
    let end = file_name.find('.')?;
    if end <= start {
        return None;
    }
    Some(&file_name[start..end])
}

/// 待播放的台词序列
pub type Conversation = Vec<DialogueLine>;

/// 组合两个角色的嘲讽对话
///
/// 双方都有指名对方的嘲讽时，对话就是这两句；否则各自最多贡献一句随机的无目标嘲讽。
pub fn compose_taunt<R: Rng + ?Sized>(
    bank: &DialogueBank,
    a: &str,
    b: &str,
    rng: &mut R,
) -> Conversation {
    let empty = UnitDialogue::default();
    let da = bank.get(a).unwrap_or(&empty);
    let db = bank.get(b).unwrap_or(&empty);

    if let (Some(la), Some(lb)) = (da.taunt_targeting(b), db.taunt_targeting(a)) {
        return vec![la.clone(), lb.clone()];
    }

    [da, db]
        .into_iter()
        .filter_map(|d| {
            let generic: Vec<&DialogueLine> = d.taunt.iter().filter(|l| l.is_generic()).collect();
            generic.choose(rng).map(|l| (*l).clone())
        })
        .collect()
}

/// 随机挑选角色的一句普通台词
pub fn compose_normal<R: Rng + ?Sized>(
    bank: &DialogueBank,
    name: &str,
    rng: &mut R,
) -> Conversation {
    bank.get(name)
        .and_then(|d| d.normal.choose(rng))
        .cloned()
        .into_iter()
        .collect()
}

/// 正在显示的台词
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLine {
    pub speaker: String,
    pub text: String,
    /// 说话者在名册中的位置
    pub speaker_unit: UnitId,
    /// 开始显示的时刻
    pub started_at: Duration,
}

/// 对话序列器
pub struct DialogueSequencer {
    bank: DialogueBank,
    /// 角色名 -> 名册位置
    speakers: HashMap<String, UnitId>,
    conversation: Conversation,
    index: usize,
    active: bool,
    line_started_at: Duration,
    current: Option<ActiveLine>,
    rng: Box<dyn RngCore + Send>,
}

impl DialogueSequencer {
    /// 创建序列器，随机源取自操作系统熵
    pub fn new(bank: DialogueBank, roster: &Roster) -> Self {
        Self::with_rng(bank, roster, Box::new(StdRng::from_os_rng()))
    }

    /// 使用指定随机源创建序列器
    pub fn with_rng(bank: DialogueBank, roster: &Roster, rng: Box<dyn RngCore + Send>) -> Self {
        let speakers = roster
            .iter()
            .map(|(id, unit)| (unit.name().to_string(), id))
            .collect();
        Self {
            bank,
            speakers,
            conversation: Vec::new(),
            index: 0,
            active: false,
            line_started_at: Duration::ZERO,
            current: None,
            rng,
        }
    }

    /// 开始两个角色的嘲讽对话
    pub fn start_taunt(&mut self, a: &str, b: &str, now: Duration) {
        if self.active {
            self.end();
        }
        let conversation = compose_taunt(&self.bank, a, b, &mut *self.rng);
        if conversation.is_empty() {
            debug!(a = %a, b = %b, "没有可用的嘲讽台词");
            return;
        }
        self.start_playing(conversation, now);
    }

    /// 开始单个角色的普通台词
    pub fn start_normal(&mut self, name: &str, now: Duration) {
        if self.active {
            self.end();
        }
        let conversation = compose_normal(&self.bank, name, &mut *self.rng);
        if conversation.is_empty() {
            debug!(unit = %name, "没有可用的普通台词");
            return;
        }
        self.start_playing(conversation, now);
    }

    /// 从头播放一段对话，并立即载入第一句
    pub fn start_playing(&mut self, conversation: Conversation, now: Duration) {
        if self.active {
            self.end();
        }
        if conversation.is_empty() {
            self.active = false;
            return;
        }
        self.conversation = conversation;
        self.index = 0;
        self.active = true;
        self.advance(now);
    }

    /// 载入下一句台词
    ///
    /// 对话已播完时结束会话。说话者不在名册中时结束会话并返回错误。
    /// 无论台词是否有效，下标都前进一位。
    pub fn display_next_line(&mut self, now: Duration) -> Result<(), DialogueError> {
        let Some(line) = self.conversation.get(self.index).cloned() else {
            self.end();
            return Ok(());
        };

        if line.is_valid() {
            let Some(&unit) = self.speakers.get(&line.speaker) else {
                self.end();
                return Err(DialogueError::SpeakerNotFound {
                    speaker: line.speaker,
                });
            };
            self.line_started_at = now;
            self.current = Some(ActiveLine {
                speaker: line.speaker,
                text: line.line,
                speaker_unit: unit,
                started_at: now,
            });
        } else {
            warn!(index = self.index, speaker = %line.speaker, "跳过无效台词");
        }

        self.index += 1;
        Ok(())
    }

    fn advance(&mut self, now: Duration) {
        if let Err(e) = self.display_next_line(now) {
            error!(error = %e, "对话会话中止");
        }
    }

    /// 每个 tick 调用一次：当前台词停留超时后切到下一句
    pub fn update(&mut self, now: Duration) {
        if !self.active {
            return;
        }
        if now.saturating_sub(self.line_started_at) > LINE_DWELL {
            self.advance(now);
        }
    }

    /// 结束会话并清空所有显示状态
    pub fn end(&mut self) {
        self.active = false;
        self.conversation.clear();
        self.index = 0;
        self.current = None;
        self.line_started_at = Duration::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 正在显示的台词
    pub fn active_line(&self) -> Option<&ActiveLine> {
        self.current.as_ref().filter(|_| self.active)
    }

    /// 对话气泡的锚点：说话者**当前**的显示位置
    pub fn bubble_anchor(&self, roster: &Roster) -> Option<Position> {
        let line = self.active_line()?;
        roster.get(line.speaker_unit).map(|u| u.position())
    }

    pub fn conversation(&self) -> &[DialogueLine] {
        &self.conversation
    }

    /// 下一句将要载入的下标
    pub fn line_index(&self) -> usize {
        self.index
    }

    pub fn bank(&self) -> &DialogueBank {
        &self.bank
    }
}

impl SelectionListener for DialogueSequencer {
    fn selection_changed(&mut self, pair: SelectionPair, roster: &Roster, now: Duration) {
        let name = |id: Option<UnitId>| {
            id.and_then(|id| roster.get(id))
                .map(|u| u.name().to_string())
        };

        match (name(pair.primary), name(pair.secondary)) {
            (Some(a), Some(b)) => self.start_taunt(&a, &b, now),
            (Some(one), None) | (None, Some(one)) => self.start_normal(&one, now),
            (None, None) => {
                if self.active {
                    self.end();
                }
            }
        }
    }
}

impl std::fmt::Debug for DialogueSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueSequencer")
            .field("active", &self.active)
            .field("index", &self.index)
            .field("conversation", &self.conversation)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
