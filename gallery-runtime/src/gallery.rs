//! # Gallery 模块
//!
//! 把名册、选择协调器、对话序列器与浏览器布局组合成一个会话。
//!
//! 呈现层每帧调用 [`Gallery::tick`]，把指针事件交给 [`Gallery::handle_pointer`]，
//! 再通过 [`Gallery::view`] 或各个访问器读取需要绘制的内容。

use std::time::Duration;

use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use crate::browser::{Browser, Canvas, Hit};
use crate::clock::Clock;
use crate::dialogue::{DialogueBank, DialogueSequencer};
use crate::input::PointerEvent;
use crate::roster::{Roster, UnitId};
use crate::selection::{SelectionCoordinator, SelectionOutcome, Slot};
use crate::unit::{Position, UnitState};

/// 槽中角色的显示快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: Slot,
    pub unit: String,
    pub state: UnitState,
    pub frame: usize,
    pub health: f32,
    pub atk: f32,
    pub position: Position,
}

/// 当前台词的显示快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub speaker: String,
    pub text: String,
    pub anchor: Option<Position>,
}

/// 一帧的显示快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryView {
    pub slots: Vec<SlotView>,
    pub line: Option<LineView>,
    pub scroll: f32,
}

/// 浏览会话
pub struct Gallery {
    clock: Box<dyn Clock>,
    roster: Roster,
    selection: SelectionCoordinator,
    dialogue: DialogueSequencer,
    browser: Browser,
}

impl Gallery {
    pub fn new(roster: Roster, bank: DialogueBank, canvas: Canvas, clock: Box<dyn Clock>) -> Self {
        let dialogue = DialogueSequencer::new(bank, &roster);
        Self::assemble(roster, dialogue, canvas, clock)
    }

    /// 使用指定随机源创建（用于可复现的对话选择）
    pub fn with_rng(
        roster: Roster,
        bank: DialogueBank,
        canvas: Canvas,
        clock: Box<dyn Clock>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        let dialogue = DialogueSequencer::with_rng(bank, &roster, rng);
        Self::assemble(roster, dialogue, canvas, clock)
    }

    fn assemble(
        roster: Roster,
        dialogue: DialogueSequencer,
        canvas: Canvas,
        clock: Box<dyn Clock>,
    ) -> Self {
        let browser = Browser::new(canvas, roster.len());
        Self {
            clock,
            roster,
            selection: SelectionCoordinator::new(),
            dialogue,
            browser,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// 处理一个指针事件，返回命中的目标
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<Hit> {
        match event {
            PointerEvent::Press { x, y, button } => {
                let occupied: Vec<Slot> = self.selection.occupied().map(|(s, _)| s).collect();
                let hit = self.browser.hit_test(x, y, &occupied)?;
                match hit {
                    Hit::Card(unit) => {
                        self.click_unit(unit, button.slot());
                    }
                    Hit::StateButton { slot, state } => {
                        self.force_state(slot, state);
                    }
                }
                Some(hit)
            }
            PointerEvent::Wheel { y, delta_y } => {
                self.browser.scroll_by(y, delta_y);
                None
            }
        }
    }

    /// 点击角色并请求放入槽
    pub fn click_unit(&mut self, unit: UnitId, slot: Slot) -> SelectionOutcome {
        let now = self.clock.now();
        let outcome = self
            .selection
            .click(&mut self.roster, unit, slot, now, &mut self.dialogue);
        debug!(unit = unit.0, ?slot, ?outcome, "点击角色");
        outcome
    }

    /// 直接设置槽中角色的状态
    pub fn force_state(&mut self, slot: Slot, state: UnitState) -> bool {
        let now = self.clock.now();
        self.selection
            .force_state(&mut self.roster, slot, state, now)
    }

    /// 推进一帧：只推进槽中角色的动画，然后推进对话
    pub fn tick(&mut self) {
        let now = self.clock.now();
        for (_, id) in self.selection.occupied() {
            if let Some(unit) = self.roster.get_mut(id) {
                unit.tick(now);
            }
        }
        self.dialogue.update(now);
    }

    /// 当前帧的显示快照
    pub fn view(&self) -> GalleryView {
        let slots = self
            .selection
            .occupied()
            .filter_map(|(slot, id)| {
                let unit = self.roster.get(id)?;
                Some(SlotView {
                    slot,
                    unit: unit.name().to_string(),
                    state: unit.state(),
                    frame: unit.current_clip().current_index(),
                    health: unit.current_health(),
                    atk: unit.atk(),
                    position: unit.position(),
                })
            })
            .collect();

        let line = self.dialogue.active_line().map(|line| LineView {
            speaker: line.speaker.clone(),
            text: line.text.clone(),
            anchor: self.dialogue.bubble_anchor(&self.roster),
        });

        GalleryView {
            slots,
            line,
            scroll: self.browser.scroll(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn selection(&self) -> &SelectionCoordinator {
        &self.selection
    }

    pub fn dialogue(&self) -> &DialogueSequencer {
        &self.dialogue
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }
}
