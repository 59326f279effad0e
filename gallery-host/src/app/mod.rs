//! # App 模块
//!
//! 启动编排：配置 -> 数据 -> 名册 -> 资源 -> 会话。

use std::io;
use std::sync::Arc;

use gallery_runtime::{Canvas, Clock, DialogueBank, Gallery, Roster, UnitDescriptor};
use thiserror::Error;
use tracing::info;

use crate::assets::{AssetLoader, LoadStatus};
use crate::config::{AppConfig, ConfigError};
use crate::data::{GalleryData, load_data};
use crate::resources::{FsSource, ResourceSource};

/// 宿主层错误
#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("数据目录中没有可用的角色: {dir}")]
    NoUnits { dir: String },

    #[error("未启用 server feature")]
    ServerDisabled,
}

/// 数据与资源都已就绪的图鉴
pub struct LoadedGallery {
    /// 名册描述（供 `/api/units` 与报告使用）
    pub units: Vec<UnitDescriptor>,
    pub dialogue: DialogueBank,
    pub roster: Roster,
    pub status: LoadStatus,
}

impl LoadedGallery {
    /// 全部片段中仍为缺失占位的帧数
    pub fn missing_frames(&self) -> usize {
        self.roster
            .iter()
            .flat_map(|(_, unit)| unit.clips().iter().map(|(_, clip)| clip.missing_frames()))
            .sum()
    }

    /// 缺少血条皮肤的角色数
    pub fn missing_health_bars(&self) -> usize {
        self.roster
            .iter()
            .filter(|(_, unit)| unit.health_bar_skin().is_none())
            .count()
    }

    /// 组装浏览会话
    pub fn into_gallery(self, canvas: Canvas, clock: Box<dyn Clock>) -> Gallery {
        Gallery::new(self.roster, self.dialogue, canvas, clock)
    }
}

/// 读取数据目录
pub fn load_gallery_data(config: &AppConfig) -> GalleryData {
    load_data(&FsSource::new(&config.data_dir))
}

/// 读取数据并阻塞加载全部图像资源
///
/// 数据目录中没有任何角色时返回 [`HostError::NoUnits`]。
pub fn load_gallery(config: &AppConfig) -> Result<LoadedGallery, HostError> {
    let data = load_gallery_data(config);
    if data.units.is_empty() {
        return Err(HostError::NoUnits {
            dir: config.data_dir.display().to_string(),
        });
    }

    let mut roster = Roster::from_descriptors(data.units.iter().cloned());
    let source: Arc<dyn ResourceSource> = Arc::new(FsSource::new(&config.assets_root));
    let mut loader = AssetLoader::start(&roster, source, config.loading.workers)?;
    let status = loader.wait_ready(&mut roster);
    info!(units = roster.len(), ?status, "图鉴加载完成");

    Ok(LoadedGallery {
        units: data.units,
        dialogue: data.dialogue,
        roster,
        status,
    })
}
