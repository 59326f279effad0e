//! # Sprite 模块
//!
//! 单个动作片段的帧序列推进器。
//!
//! ## 推进规则
//!
//! ```text
//! tick():
//!   stopped 或帧列表为空 -> 不动
//!   frame_counter += 1
//!   frame_counter == speed -> frame_counter = 0, current_index += 1
//!   越过最后一帧 -> looping ? 0 : len - 1
//! ```
//!
//! 帧以 `Option<Frame>` 存储：加载失败的帧为 `None`（缺失占位），
//! 不影响推进，渲染层遇到 `None` 什么也不画。

use std::sync::Arc;

use crate::config::SpriteConfig;

/// 默认推进速度（每 5 个 tick 前进一帧）
pub const DEFAULT_ANIMATION_SPEED: u32 = 5;

/// 解码后的帧图像（RGBA8，行优先）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FrameImage {
    /// 创建帧图像
    ///
    /// `pixels` 长度必须等于 `width * height * 4`，否则返回 `None`。
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// 裁剪左上角起的矩形区域（超出部分被截断）
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> FrameImage {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for row in y..y + height {
            let start = (row as usize * self.width as usize + x as usize) * 4;
            pixels.extend_from_slice(&self.pixels[start..start + width as usize * 4]);
        }

        FrameImage {
            width,
            height,
            pixels,
        }
    }
}

/// 共享的帧句柄
pub type Frame = Arc<FrameImage>;

/// 帧序列推进器
#[derive(Debug, Clone)]
pub struct Animator {
    /// 帧来源配置
    config: SpriteConfig,
    /// 帧列表（长度固定为 `config.total_size`）
    frames: Vec<Option<Frame>>,
    current_index: usize,
    frame_counter: u32,
    speed: u32,
    looping: bool,
    stopped: bool,
}

impl Animator {
    /// 根据精灵配置创建推进器，所有帧初始为缺失占位
    pub fn new(config: SpriteConfig) -> Self {
        let frames = vec![None; config.total_size];
        Self {
            config,
            frames,
            current_index: 0,
            frame_counter: 0,
            speed: DEFAULT_ANIMATION_SPEED,
            looping: true,
            stopped: false,
        }
    }

    /// 推进一个 tick
    pub fn tick(&mut self) {
        if self.stopped || self.frames.is_empty() {
            return;
        }

        self.frame_counter += 1;
        if self.frame_counter >= self.speed {
            self.frame_counter = 0;
            self.current_index += 1;

            if self.current_index >= self.frames.len() {
                self.current_index = if self.looping {
                    0
                } else {
                    self.frames.len() - 1
                };
            }
        }
    }

    /// 设置是否只播放一次，同时回到第一帧
    pub fn set_play_once(&mut self, play_once: bool) {
        self.looping = !play_once;
        self.current_index = 0;
        self.frame_counter = 0;
    }

    /// 回到第一帧（不改变循环模式）
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.frame_counter = 0;
    }

    /// 暂停（保留当前位置）
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// 继续
    pub fn resume(&mut self) {
        self.stopped = false;
    }

    /// 设置推进速度（每多少 tick 前进一帧，最小为 1）
    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed.max(1);
    }

    /// 是否停在（或已越过）最后一帧
    ///
    /// 空片段视为已到达最后一帧。
    pub fn is_at_last_frame(&self) -> bool {
        self.frames.is_empty() || self.current_index >= self.frames.len() - 1
    }

    /// 写入第 `index` 帧，越界时忽略并返回 `false`
    pub fn set_frame(&mut self, index: usize, frame: Option<Frame>) -> bool {
        match self.frames.get_mut(index) {
            Some(slot) => {
                *slot = frame;
                true
            }
            None => false,
        }
    }

    /// 当前帧（缺失占位时为 `None`）
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current_index).and_then(Option::as_ref)
    }

    /// 第 `index` 帧
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index).and_then(Option::as_ref)
    }

    /// 所有帧的资源逻辑路径
    pub fn frame_paths(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.frames.len()).map(|i| self.config.frame_path(i))
    }

    /// 缺失占位的帧数
    pub fn missing_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_none()).count()
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
pub(crate) fn test_sprite_config(action: &str, total_size: usize) -> SpriteConfig {
    SpriteConfig {
        character_folder: "Test".to_string(),
        character_action: action.to_string(),
        image_file_name: format!("{}_", action.to_lowercase()),
        file_extension: ".png".to_string(),
        total_size,
        pos_x: 100.0,
        pos_y: 200.0,
        scale: 1.0,
    }
}
