//! # Unit 模块
//!
//! 角色与其动作状态机。
//!
//! ## 状态转换
//!
//! ```text
//! Idle   -- 循环播放，不自动转换
//! Walk   -- 播放到最后一帧 -> Idle
//! Attack -- 播放到最后一帧 -> Idle
//! Death  -- 停在最后一帧，且进入 Death 已超过 DEATH_COOLDOWN -> Idle
//! ```
//!
//! 所有状态切换都经过 [`Unit::set_state`]：它同时决定播放策略（Idle 循环、其余只播一次）
//! 并在进入 Death 时记录进入时刻，因此不存在绕过时间戳的入口。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{UnitDescriptor, UnitDetail};
use crate::sprite::{Animator, Frame};

/// 死亡冷却：停在最后一帧后还需经过的时长
pub const DEATH_COOLDOWN: Duration = Duration::from_millis(3000);

/// 头像裁剪尺寸
pub const PORTRAIT_SIZE: u32 = 100;

/// 角色动作状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitState {
    #[default]
    Idle,
    Walk,
    Attack,
    Death,
}

impl UnitState {
    /// 全部状态（也是状态按钮的排列顺序）
    pub const ALL: [UnitState; 4] = [
        UnitState::Idle,
        UnitState::Walk,
        UnitState::Attack,
        UnitState::Death,
    ];

    /// 在片段表中的下标
    pub fn index(self) -> usize {
        self as usize
    }

    /// 是否循环播放
    pub fn loops(self) -> bool {
        matches!(self, UnitState::Idle)
    }

    /// 显示名
    pub fn label(self) -> &'static str {
        match self {
            UnitState::Idle => "IDLE",
            UnitState::Walk => "WALK",
            UnitState::Attack => "ATTACK",
            UnitState::Death => "DEATH",
        }
    }
}

/// 状态到片段的查找表
#[derive(Debug, Clone)]
pub struct ClipSet {
    clips: [Animator; 4],
}

impl ClipSet {
    /// 按 Idle/Walk/Attack/Death 顺序创建
    pub fn new(idle: Animator, walk: Animator, attack: Animator, death: Animator) -> Self {
        Self {
            clips: [idle, walk, attack, death],
        }
    }

    pub fn get(&self, state: UnitState) -> &Animator {
        &self.clips[state.index()]
    }

    pub fn get_mut(&mut self, state: UnitState) -> &mut Animator {
        &mut self.clips[state.index()]
    }

    /// 按状态顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (UnitState, &Animator)> {
        UnitState::ALL.into_iter().zip(self.clips.iter())
    }
}

/// 显示位置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 角色
#[derive(Debug, Clone)]
pub struct Unit {
    detail: UnitDetail,
    current_health: f32,
    clips: ClipSet,
    state: UnitState,
    selected: bool,
    position: Position,
    death_entered_at: Duration,
    portrait: Option<Frame>,
    health_bar_skin: Option<Frame>,
}

impl Unit {
    /// 从名册描述创建角色，初始状态为 Idle
    pub fn from_descriptor(descriptor: UnitDescriptor) -> Self {
        let clips = ClipSet::new(
            Animator::new(descriptor.idle_config),
            Animator::new(descriptor.walk_config),
            Animator::new(descriptor.attack_config),
            Animator::new(descriptor.death_config),
        );
        Self {
            current_health: descriptor.detail.health,
            detail: descriptor.detail,
            clips,
            state: UnitState::Idle,
            selected: false,
            position: Position::default(),
            death_entered_at: Duration::ZERO,
            portrait: None,
            health_bar_skin: None,
        }
    }

    /// 资源全部就绪后的初始化
    ///
    /// 从第一帧 Idle 图像裁出头像，并移动到 Idle 配置的默认位置。
    pub fn initialize(&mut self) {
        let idle = self.clips.get(UnitState::Idle);
        self.portrait = match idle.frame(0) {
            Some(frame) if frame.width > 0 => {
                Some(Frame::new(frame.crop(0, 0, PORTRAIT_SIZE, PORTRAIT_SIZE)))
            }
            _ => {
                tracing::error!(unit = %self.detail.name, "角色缺少有效的 Idle 首帧，无法生成头像");
                None
            }
        };

        let config = idle.config();
        self.position = Position::new(config.pos_x, config.pos_y);
    }

    /// 切换状态
    ///
    /// 目标片段按状态的播放策略重新开始；进入 Death 时记录进入时刻。
    pub fn set_state(&mut self, state: UnitState, now: Duration) {
        self.state = state;
        self.clips.get_mut(state).set_play_once(!state.loops());
        if state == UnitState::Death {
            self.death_entered_at = now;
        }
    }

    /// 推进一个 tick：推进当前片段，然后检查自动转换
    pub fn tick(&mut self, now: Duration) {
        let clip = self.clips.get_mut(self.state);
        clip.tick();
        let finished = clip.is_at_last_frame();

        let back_to_idle = match self.state {
            UnitState::Idle => false,
            UnitState::Walk | UnitState::Attack => finished,
            UnitState::Death => finished && self.death_cooldown_elapsed(now),
        };

        if back_to_idle {
            self.set_state(UnitState::Idle, now);
        }
    }

    fn death_cooldown_elapsed(&self, now: Duration) -> bool {
        now.saturating_sub(self.death_entered_at) > DEATH_COOLDOWN
    }

    /// 被选中：标记选中并播放一次攻击动作
    pub fn select(&mut self, now: Duration) {
        self.selected = true;
        self.set_state(UnitState::Attack, now);
    }

    /// 取消选中：回到 Idle
    pub fn unselect(&mut self, now: Duration) {
        self.selected = false;
        self.set_state(UnitState::Idle, now);
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// 设置当前生命值（限制在 `[0, max_health]`）
    pub fn set_current_health(&mut self, health: f32) {
        self.current_health = health.clamp(0.0, self.max_health().max(0.0));
    }

    /// 当前生命比例（`[0, 1]`）
    pub fn health_ratio(&self) -> f32 {
        if self.max_health() <= 0.0 {
            return 0.0;
        }
        self.current_health / self.max_health()
    }

    pub fn set_health_bar_skin(&mut self, skin: Option<Frame>) {
        self.health_bar_skin = skin;
    }

    pub fn name(&self) -> &str {
        &self.detail.name
    }

    pub fn detail(&self) -> &UnitDetail {
        &self.detail
    }

    pub fn max_health(&self) -> f32 {
        self.detail.health
    }

    pub fn current_health(&self) -> f32 {
        self.current_health
    }

    pub fn atk(&self) -> f32 {
        self.detail.atk
    }

    pub fn def(&self) -> f32 {
        self.detail.def
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn death_entered_at(&self) -> Duration {
        self.death_entered_at
    }

    pub fn clips(&self) -> &ClipSet {
        &self.clips
    }

    pub fn clips_mut(&mut self) -> &mut ClipSet {
        &mut self.clips
    }

    /// 当前状态对应的片段
    pub fn current_clip(&self) -> &Animator {
        self.clips.get(self.state)
    }

    pub fn portrait(&self) -> Option<&Frame> {
        self.portrait.as_ref()
    }

    pub fn health_bar_skin(&self) -> Option<&Frame> {
        self.health_bar_skin.as_ref()
    }
}

#[cfg(test)]
pub(crate) fn test_unit(name: &str, health: f32, frames: usize) -> Unit {
    use crate::sprite::test_sprite_config;

    Unit::from_descriptor(UnitDescriptor {
        detail: UnitDetail {
            name: name.to_string(),
            description: String::new(),
            health,
            atk: 10.0,
            def: 5.0,
        },
        idle_config: test_sprite_config("Idle", frames),
        attack_config: test_sprite_config("Attack", frames),
        walk_config: test_sprite_config("Walk", frames),
        death_config: test_sprite_config("Death", frames),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::FrameImage;

    const SPEED: usize = crate::sprite::DEFAULT_ANIMATION_SPEED as usize;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    /// 推进 n 个 tick，时间保持不变
    fn run(unit: &mut Unit, n: usize, now: Duration) {
        for _ in 0..n {
            unit.tick(now);
        }
    }

    #[test]
    fn test_initial_state() {
        let unit = test_unit("Alpha", 100.0, 4);
        assert_eq!(unit.state(), UnitState::Idle);
        assert!(!unit.is_selected());
        assert_eq!(unit.current_health(), 100.0);
        assert_eq!(unit.clips().iter().count(), 4);
    }

    #[test]
    fn test_attack_returns_to_idle() {
        let mut unit = test_unit("Alpha", 100.0, 3);
        unit.set_state(UnitState::Attack, ms(0));
        assert!(!unit.current_clip().is_looping());

        // 到达最后一帧 (index 2) 需要 2 * SPEED 个 tick
        run(&mut unit, 2 * SPEED - 1, ms(0));
        assert_eq!(unit.state(), UnitState::Attack);

        unit.tick(ms(0));
        assert_eq!(unit.state(), UnitState::Idle);
        assert!(unit.current_clip().is_looping());
        assert_eq!(unit.current_clip().current_index(), 0);
    }

    #[test]
    fn test_walk_returns_to_idle() {
        let mut unit = test_unit("Alpha", 100.0, 2);
        unit.set_state(UnitState::Walk, ms(0));
        run(&mut unit, SPEED, ms(0));
        assert_eq!(unit.state(), UnitState::Idle);
    }

    #[test]
    fn test_idle_never_auto_transitions() {
        let mut unit = test_unit("Alpha", 100.0, 2);
        run(&mut unit, 100, ms(10_000));
        assert_eq!(unit.state(), UnitState::Idle);
    }

    #[test]
    fn test_death_requires_last_frame_and_cooldown() {
        let mut unit = test_unit("Alpha", 100.0, 3);
        unit.set_state(UnitState::Death, ms(1000));
        assert_eq!(unit.death_entered_at(), ms(1000));

        // 冷却已过但尚未到最后一帧
        unit.tick(ms(10_000));
        assert_eq!(unit.state(), UnitState::Death);

        // 到达最后一帧但冷却未过（恰好 3000ms 不算超过）
        run(&mut unit, 2 * SPEED, ms(4000));
        assert!(unit.current_clip().is_at_last_frame());
        assert_eq!(unit.state(), UnitState::Death);

        // 两个条件同时满足
        unit.tick(ms(4001));
        assert_eq!(unit.state(), UnitState::Idle);
    }

    #[test]
    fn test_death_stamp_refreshed_on_reentry() {
        let mut unit = test_unit("Alpha", 100.0, 1);
        unit.set_state(UnitState::Death, ms(0));
        unit.set_state(UnitState::Walk, ms(500));
        assert_eq!(unit.death_entered_at(), ms(0));

        unit.set_state(UnitState::Death, ms(2000));
        assert_eq!(unit.death_entered_at(), ms(2000));

        unit.tick(ms(4500));
        assert_eq!(unit.state(), UnitState::Death);
        unit.tick(ms(5001));
        assert_eq!(unit.state(), UnitState::Idle);
    }

    #[test]
    fn test_select_and_unselect() {
        let mut unit = test_unit("Alpha", 100.0, 4);
        unit.select(ms(0));
        assert!(unit.is_selected());
        assert_eq!(unit.state(), UnitState::Attack);
        assert!(!unit.current_clip().is_looping());

        unit.unselect(ms(10));
        assert!(!unit.is_selected());
        assert_eq!(unit.state(), UnitState::Idle);
    }

    #[test]
    fn test_health_clamp() {
        let mut unit = test_unit("Alpha", 80.0, 1);
        unit.set_current_health(40.0);
        assert_eq!(unit.health_ratio(), 0.5);

        unit.set_current_health(500.0);
        assert_eq!(unit.current_health(), 80.0);

        unit.set_current_health(-3.0);
        assert_eq!(unit.current_health(), 0.0);
        assert_eq!(unit.health_ratio(), 0.0);
    }

    #[test]
    fn test_initialize_portrait_and_position() {
        let mut unit = test_unit("Alpha", 100.0, 2);
        let image = FrameImage::new(120, 130, vec![7; 120 * 130 * 4]).unwrap();
        unit.clips_mut()
            .get_mut(UnitState::Idle)
            .set_frame(0, Some(Frame::new(image)));

        unit.initialize();
        let portrait = unit.portrait().unwrap();
        assert_eq!((portrait.width, portrait.height), (100, 100));
        assert_eq!(unit.position(), Position::new(100.0, 200.0));
    }

    #[test]
    fn test_initialize_without_idle_frame() {
        let mut unit = test_unit("Alpha", 100.0, 2);
        unit.initialize();
        assert!(unit.portrait().is_none());
        assert_eq!(unit.position(), Position::new(100.0, 200.0));
    }
}
