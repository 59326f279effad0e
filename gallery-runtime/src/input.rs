//! # Input 模块
//!
//! 定义呈现层向运行时传递的指针输入。
//!
//! 坐标已经由呈现层换算到逻辑画布空间，运行时只做命中测试。

use serde::{Deserialize, Serialize};

use crate::selection::Slot;

/// 指针按键
///
/// 按键只是"选哪个槽"的离散信号：主键对应主槽，副键对应副槽。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
}

impl PointerButton {
    /// 按键请求的选择槽
    pub fn slot(self) -> Slot {
        match self {
            PointerButton::Primary => Slot::Primary,
            PointerButton::Secondary => Slot::Secondary,
        }
    }
}

/// 指针事件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// 按下
    Press { x: f32, y: f32, button: PointerButton },

    /// 滚轮（`y` 为滚动时指针所在的纵坐标）
    Wheel { y: f32, delta_y: f32 },
}

impl PointerEvent {
    /// 创建按下事件
    pub fn press(x: f32, y: f32, button: PointerButton) -> Self {
        Self::Press { x, y, button }
    }

    /// 创建滚轮事件
    pub fn wheel(y: f32, delta_y: f32) -> Self {
        Self::Wheel { y, delta_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_slot_mapping() {
        assert_eq!(PointerButton::Primary.slot(), Slot::Primary);
        assert_eq!(PointerButton::Secondary.slot(), Slot::Secondary);
    }

    #[test]
    fn test_event_serialization() {
        let event = PointerEvent::press(10.0, 20.0, PointerButton::Secondary);
        let json = serde_json::to_string(&event).unwrap();
        let back: PointerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
