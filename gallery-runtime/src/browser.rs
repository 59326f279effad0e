//! # Browser 模块
//!
//! 角色浏览器的逻辑布局：底部卡片条、右侧两个状态面板、滚动。
//!
//! 运行时只负责几何与命中测试，绘制交给呈现层。所有坐标都在逻辑画布空间中。
//!
//! ```text
//! 卡片 i 中心          (165·i + 100 + scroll, h − 100)，150×150
//! 槽 j 的状态按钮 k    (w − 235 + 60·k, 255 + 200·j)，50×25
//! 滚动区              y > h − 212.5
//! ```

use serde::{Deserialize, Serialize};

use crate::roster::UnitId;
use crate::selection::Slot;
use crate::unit::UnitState;

pub const CARD_SIZE: f32 = 150.0;
pub const CARD_STRIDE: f32 = 165.0;
const CARD_OFFSET_X: f32 = 100.0;
const CARD_OFFSET_BOTTOM: f32 = 100.0;

/// 底部卡片条高度，同时也是滚轮生效区域
pub const STRIP_HEIGHT: f32 = 212.5;

pub const BUTTON_WIDTH: f32 = 50.0;
pub const BUTTON_HEIGHT: f32 = 25.0;
const BUTTON_OFFSET_RIGHT: f32 = 235.0;
const BUTTON_STRIDE_X: f32 = 60.0;
const BUTTON_BASE_Y: f32 = 255.0;

const PANEL_WIDTH: f32 = 300.0;
const PANEL_HEIGHT: f32 = 200.0;
const PANEL_BASE_Y: f32 = 100.0;

/// 逻辑画布尺寸
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// 轴对齐矩形（左上角 + 尺寸）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// 以中心点构造
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// 点是否落在矩形内（含边界）
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// 命中结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// 卡片条中的角色卡片
    Card(UnitId),
    /// 已占用槽的状态按钮
    StateButton { slot: Slot, state: UnitState },
}

/// 浏览器布局
#[derive(Debug, Clone, Default)]
pub struct Browser {
    canvas: Canvas,
    unit_count: usize,
    scroll: f32,
}

impl Browser {
    pub fn new(canvas: Canvas, unit_count: usize) -> Self {
        Self {
            canvas,
            unit_count,
            scroll: 0.0,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// 当前滚动偏移（`<= 0`）
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    /// 滚动偏移的最大幅度
    pub fn max_scroll(&self) -> f32 {
        (self.unit_count as f32 * CARD_STRIDE - self.canvas.width + 50.0).max(0.0)
    }

    /// 处理滚轮
    ///
    /// 仅当指针位于卡片条内时生效，返回是否处理。
    pub fn scroll_by(&mut self, y: f32, delta_y: f32) -> bool {
        if y <= self.canvas.height - STRIP_HEIGHT {
            return false;
        }
        self.scroll = (self.scroll - delta_y).clamp(-self.max_scroll(), 0.0);
        true
    }

    /// 第 `index` 张卡片的区域
    pub fn card_rect(&self, index: usize) -> Rect {
        Rect::centered(
            CARD_STRIDE * index as f32 + CARD_OFFSET_X + self.scroll,
            self.canvas.height - CARD_OFFSET_BOTTOM,
            CARD_SIZE,
            CARD_SIZE,
        )
    }

    /// 全部卡片
    pub fn cards(&self) -> impl Iterator<Item = (UnitId, Rect)> + '_ {
        (0..self.unit_count).map(|i| (UnitId(i), self.card_rect(i)))
    }

    /// 槽面板中某个状态按钮的区域
    pub fn button_rect(&self, slot: Slot, state: UnitState) -> Rect {
        Rect::centered(
            self.canvas.width - BUTTON_OFFSET_RIGHT + BUTTON_STRIDE_X * state.index() as f32,
            BUTTON_BASE_Y + PANEL_HEIGHT * slot.index() as f32,
            BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    /// 槽的状态面板区域
    pub fn slot_panel(&self, slot: Slot) -> Rect {
        Rect {
            x: self.canvas.width - PANEL_WIDTH,
            y: PANEL_BASE_Y + PANEL_HEIGHT * slot.index() as f32,
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
        }
    }

    /// 滚动条区域
    pub fn scroll_bar(&self) -> Rect {
        let content = self.unit_count as f32 * CARD_STRIDE + 100.0;
        let width = self.canvas.width;
        Rect {
            x: (-self.scroll / content) * width + 20.0,
            y: self.canvas.height - 12.0,
            width: (width / content) * width,
            height: 7.0,
        }
    }

    /// 命中测试
    ///
    /// `occupied` 为当前已占用的槽；空槽不显示按钮，也不参与命中。
    pub fn hit_test(&self, x: f32, y: f32, occupied: &[Slot]) -> Option<Hit> {
        if let Some((id, _)) = self.cards().find(|(_, rect)| rect.contains(x, y)) {
            return Some(Hit::Card(id));
        }

        occupied.iter().find_map(|&slot| {
            UnitState::ALL
                .into_iter()
                .find(|&state| self.button_rect(slot, state).contains(x, y))
                .map(|state| Hit::StateButton { slot, state })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn browser(n: usize) -> Browser {
        Browser::new(Canvas::default(), n)
    }

    #[test]
    fn test_card_layout() {
        let b = browser(3);
        assert_eq!(b.card_rect(0).center(), (100.0, 620.0));
        assert_eq!(b.card_rect(2).center(), (430.0, 620.0));
        assert_eq!(b.card_rect(1).width, CARD_SIZE);
    }

    #[test]
    fn test_hit_card_edges_inclusive() {
        let b = browser(2);
        assert_eq!(b.hit_test(25.0, 545.0, &[]), Some(Hit::Card(UnitId(0))));
        assert_eq!(b.hit_test(175.0, 695.0, &[]), Some(Hit::Card(UnitId(0))));
        // 卡片之间的间隙
        assert_eq!(b.hit_test(178.0, 620.0, &[]), None);
        assert_eq!(b.hit_test(190.0, 620.0, &[]), Some(Hit::Card(UnitId(1))));
    }

    #[test]
    fn test_state_buttons_only_for_occupied_slots() {
        let b = browser(1);
        // 副槽 Attack 按钮中心 (1280 - 235 + 120, 455)
        let (x, y) = (1165.0, 455.0);
        assert_eq!(b.hit_test(x, y, &[Slot::Primary]), None);
        assert_eq!(
            b.hit_test(x, y, &[Slot::Primary, Slot::Secondary]),
            Some(Hit::StateButton {
                slot: Slot::Secondary,
                state: UnitState::Attack
            })
        );
        assert_eq!(
            b.hit_test(1045.0, 255.0, &[Slot::Primary]),
            Some(Hit::StateButton {
                slot: Slot::Primary,
                state: UnitState::Idle
            })
        );
    }

    #[test]
    fn test_wheel_only_in_strip() {
        let mut b = browser(20);
        assert!(!b.scroll_by(300.0, 100.0));
        assert!(!b.scroll_by(720.0 - STRIP_HEIGHT, 100.0));
        assert_eq!(b.scroll(), 0.0);

        assert!(b.scroll_by(700.0, 100.0));
        assert_eq!(b.scroll(), -100.0);
        assert_eq!(b.card_rect(0).center().0, 0.0);
    }

    #[test]
    fn test_scroll_clamped() {
        let mut b = browser(20);
        // 20 * 165 - 1280 + 50 = 2070
        assert_eq!(b.max_scroll(), 2070.0);
        b.scroll_by(700.0, 10_000.0);
        assert_eq!(b.scroll(), -2070.0);
        b.scroll_by(700.0, -10_000.0);
        assert_eq!(b.scroll(), 0.0);
    }

    #[test]
    fn test_short_list_does_not_scroll() {
        let mut b = browser(3);
        assert_eq!(b.max_scroll(), 0.0);
        b.scroll_by(700.0, 500.0);
        assert_eq!(b.scroll(), 0.0);
    }

    #[test]
    fn test_scroll_bar_tracks_offset() {
        let mut b = browser(20);
        let before = b.scroll_bar();
        b.scroll_by(700.0, 330.0);
        let after = b.scroll_bar();
        assert!(after.x > before.x);
        assert_eq!(after.width, before.width);
    }
}
