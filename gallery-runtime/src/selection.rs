//! # Selection 模块
//!
//! 双槽选择协调器。
//!
//! ## 点击规则
//!
//! 点击角色 U 并请求槽 S 时：
//!
//! 1. U 已在 S 中：清空 S，U 取消选中回到 Idle
//! 2. U 在另一个槽中：忽略（同一角色不能同时占两个槽）
//! 3. 否则：S 中如有其他角色 V，先取消 V；U 进入 S、被选中、播放攻击动作并移动到 S 的锚点
//!
//! 每次占用变化后，同步通知 [`SelectionListener`] 当前的 (主槽, 副槽)。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::roster::{Roster, UnitId};
use crate::unit::{Position, UnitState};

/// 选择槽
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Primary,
    Secondary,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Primary, Slot::Secondary];

    pub fn index(self) -> usize {
        self as usize
    }

    /// 另一个槽
    pub fn other(self) -> Slot {
        match self {
            Slot::Primary => Slot::Secondary,
            Slot::Secondary => Slot::Primary,
        }
    }

    /// 槽的固定锚点（角色进入槽后的显示位置）
    pub fn anchor(self) -> Position {
        match self {
            Slot::Primary => Position::new(350.0, 350.0),
            Slot::Secondary => Position::new(450.0, 450.0),
        }
    }
}

/// 两个槽的当前占用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionPair {
    pub primary: Option<UnitId>,
    pub secondary: Option<UnitId>,
}

impl SelectionPair {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

/// 选择变化监听者
pub trait SelectionListener {
    /// 占用发生变化后调用，`pair` 为变化后的占用
    fn selection_changed(&mut self, pair: SelectionPair, roster: &Roster, now: Duration);
}

/// 不关心选择变化时使用
impl SelectionListener for () {
    fn selection_changed(&mut self, _pair: SelectionPair, _roster: &Roster, _now: Duration) {}
}

/// 一次点击的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// 清空了请求的槽
    Cleared,
    /// 角色进入请求的槽，`replaced` 为被替换出去的角色
    Assigned { replaced: Option<UnitId> },
    /// 未发生变化
    Ignored,
}

/// 双槽选择协调器
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    slots: [Option<UnitId>; 2],
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一次对角色的点击
    pub fn click(
        &mut self,
        roster: &mut Roster,
        unit: UnitId,
        slot: Slot,
        now: Duration,
        listener: &mut dyn SelectionListener,
    ) -> SelectionOutcome {
        if roster.get(unit).is_none() {
            return SelectionOutcome::Ignored;
        }

        let outcome = if self.occupant(slot) == Some(unit) {
            self.slots[slot.index()] = None;
            if let Some(u) = roster.get_mut(unit) {
                u.unselect(now);
            }
            SelectionOutcome::Cleared
        } else if self.occupant(slot.other()) == Some(unit) {
            SelectionOutcome::Ignored
        } else {
            let replaced = self.slots[slot.index()].take();
            if let Some(v) = replaced.and_then(|id| roster.get_mut(id)) {
                v.unselect(now);
            }
            self.slots[slot.index()] = Some(unit);
            if let Some(u) = roster.get_mut(unit) {
                u.select(now);
                u.set_position(slot.anchor());
            }
            SelectionOutcome::Assigned { replaced }
        };

        if outcome != SelectionOutcome::Ignored {
            listener.selection_changed(self.pair(), roster, now);
        }
        outcome
    }

    /// 直接设置某个槽中角色的状态
    ///
    /// 槽为空时返回 `false`。
    pub fn force_state(
        &self,
        roster: &mut Roster,
        slot: Slot,
        state: UnitState,
        now: Duration,
    ) -> bool {
        match self.occupant(slot).and_then(|id| roster.get_mut(id)) {
            Some(unit) => {
                unit.set_state(state, now);
                true
            }
            None => false,
        }
    }

    /// 槽中的角色
    pub fn occupant(&self, slot: Slot) -> Option<UnitId> {
        self.slots[slot.index()]
    }

    /// 角色所在的槽
    pub fn slot_of(&self, unit: UnitId) -> Option<Slot> {
        Slot::ALL.into_iter().find(|s| self.occupant(*s) == Some(unit))
    }

    pub fn pair(&self) -> SelectionPair {
        SelectionPair {
            primary: self.slots[Slot::Primary.index()],
            secondary: self.slots[Slot::Secondary.index()],
        }
    }

    /// 所有被占用的槽
    pub fn occupied(&self) -> impl Iterator<Item = (Slot, UnitId)> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(|s| self.occupant(s).map(|id| (s, id)))
    }
}
