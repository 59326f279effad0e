//! # Gallery Runtime
//!
//! 角色图鉴的核心运行时库。
//!
//! ## 架构概述
//!
//! `gallery-runtime` 是纯逻辑核心，不做任何文件、网络或解码 IO。
//! 宿主层（Host）负责读取配置与图像，运行时只消费解析好的数据与解码后的帧：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │── UnitRecord / DialogueBank ─────►│ Roster / DialogueSequencer
//!   │── CompletionHandle::complete ────►│ LoadTracker（Ready 时 initialize_all）
//!   │── PointerEvent ──────────────────►│ Gallery::handle_pointer
//!   │── tick() ────────────────────────►│ 角色状态机 + 对话节奏
//!   │◄── GalleryView ───────────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`Gallery`]：一次浏览会话
//! - [`Unit`]：角色与其动作状态机
//! - [`Animator`]：帧序列推进器
//! - [`SelectionCoordinator`]：双槽选择
//! - [`DialogueSequencer`]：对话序列
//! - [`LoadTracker`]：资源加载屏障
//!
//! ## 时间
//!
//! 所有时间判断都读取注入的 [`Clock`]，测试中使用 [`ManualClock`] 精确推进。
//!
//! ## 模块结构
//!
//! - [`config`]：精灵配置与角色记录解析
//! - [`sprite`]：帧图像与推进器
//! - [`unit`]：角色状态机
//! - [`roster`]：角色名册
//! - [`selection`]：双槽选择
//! - [`dialogue`]：台词库与对话序列
//! - [`browser`]：浏览器布局与命中测试
//! - [`barrier`]：加载屏障
//! - [`gallery`]：会话组合
//! - [`error`]：错误类型定义

pub mod barrier;
pub mod browser;
pub mod clock;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod gallery;
pub mod input;
pub mod roster;
pub mod selection;
pub mod sprite;
pub mod unit;

// 重导出核心类型
pub use barrier::{CompletionHandle, LoadBarrier, LoadProgress, LoadTracker};
pub use browser::{Browser, Canvas, Hit, Rect};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MAX_FRAMES, SpriteConfig, UnitDescriptor, UnitDetail, UnitRecord};
pub use dialogue::{
    ActiveLine, Conversation, DialogueBank, DialogueLine, DialogueSequencer, LINE_DWELL,
    UnitDialogue, compose_normal, compose_taunt, dialogue_owner_from_file_name,
};
pub use error::{DialogueError, ParseError};
pub use gallery::{Gallery, GalleryView, LineView, SlotView};
pub use input::{PointerButton, PointerEvent};
pub use roster::{Roster, UnitId};
pub use selection::{SelectionCoordinator, SelectionListener, SelectionOutcome, SelectionPair, Slot};
pub use sprite::{Animator, DEFAULT_ANIMATION_SPEED, Frame, FrameImage};
pub use unit::{ClipSet, DEATH_COOLDOWN, Position, Unit, UnitState};
