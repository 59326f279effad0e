//! # Assets 模块
//!
//! 图像资源的并行加载。
//!
//! ## 流程
//!
//! 1. 按名册生成全部请求：每个角色每个动作每一帧一张图，外加一张血条皮肤
//! 2. 在派发任何请求之前，把总数一次性登记到 [`LoadTracker`]
//! 3. 固定数量的工作线程读取字节、用 `image` 解码为 RGBA8，并通过 [`CompletionHandle`] 结算
//! 4. 编排者在自己的线程上 [`AssetLoader::pump`]，把结果写回名册；跨入 Ready 时初始化全部角色
//!
//! 读取或解码失败的资源记录警告后以 `None` 结算，对应帧保持缺失占位。

use std::io;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use gallery_runtime::{
    CompletionHandle, Frame, FrameImage, LoadProgress, LoadTracker, Roster, UnitId, UnitState,
};
use tracing::{debug, info, warn};

use crate::resources::{ResourceError, ResourceSource};

/// 血条皮肤的逻辑路径
pub const HEALTH_BAR_PATH: &str = "HealthBar/HealthBar.png";

/// 加载结果写回的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetTarget {
    Frame {
        unit: UnitId,
        state: UnitState,
        index: usize,
    },
    HealthBar {
        unit: UnitId,
    },
}

/// 单个资源请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub target: AssetTarget,
    pub path: String,
}

/// 已结算的资源（失败时 `frame` 为 `None`）
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub target: AssetTarget,
    pub frame: Option<Frame>,
}

/// 加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading { completed: usize, expected: usize },
    Ready,
}

/// 为名册生成全部资源请求
pub fn plan_requests(roster: &Roster) -> Vec<AssetRequest> {
    let mut requests = Vec::new();
    for (unit, u) in roster.iter() {
        for (state, clip) in u.clips().iter() {
            requests.extend(clip.frame_paths().enumerate().map(|(index, path)| {
                AssetRequest {
                    target: AssetTarget::Frame { unit, state, index },
                    path,
                }
            }));
        }
        requests.push(AssetRequest {
            target: AssetTarget::HealthBar { unit },
            path: HEALTH_BAR_PATH.to_string(),
        });
    }
    requests
}

/// 把图像字节解码为 RGBA8 帧
pub fn decode_frame(bytes: &[u8], path: &str) -> Result<FrameImage, ResourceError> {
    let img = image::load_from_memory(bytes).map_err(|e| ResourceError::InvalidFormat {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    FrameImage::new(width, height, rgba.into_raw()).ok_or_else(|| ResourceError::InvalidFormat {
        path: path.to_string(),
        message: "像素数据长度与尺寸不符".to_string(),
    })
}

fn fetch(source: &dyn ResourceSource, path: &str) -> Result<FrameImage, ResourceError> {
    let bytes = source.read(path)?;
    decode_frame(&bytes, path)
}

/// 把一个结算结果写回名册
fn apply(roster: &mut Roster, asset: LoadedAsset) {
    match asset.target {
        AssetTarget::Frame { unit, state, index } => {
            if let Some(u) = roster.get_mut(unit) {
                u.clips_mut().get_mut(state).set_frame(index, asset.frame);
            }
        }
        AssetTarget::HealthBar { unit } => {
            if let Some(u) = roster.get_mut(unit) {
                u.set_health_bar_skin(asset.frame);
            }
        }
    }
}

type Job = (AssetRequest, CompletionHandle<LoadedAsset>);

fn worker_loop(queue: Arc<Mutex<Receiver<Job>>>, source: Arc<dyn ResourceSource>) {
    loop {
        let job = {
            let Ok(rx) = queue.lock() else {
                return;
            };
            rx.recv()
        };
        let Ok((request, handle)) = job else {
            return;
        };

        let frame = match fetch(source.as_ref(), &request.path) {
            Ok(image) => Some(Frame::new(image)),
            Err(e) => {
                warn!(path = %request.path, error = %e, "资源加载失败，使用缺失占位");
                None
            }
        };
        handle.complete(LoadedAsset {
            target: request.target,
            frame,
        });
    }
}

/// 资源加载器
pub struct AssetLoader {
    tracker: LoadTracker<LoadedAsset>,
    initialized: bool,
}

impl AssetLoader {
    /// 登记并派发名册所需的全部资源
    pub fn start(
        roster: &Roster,
        source: Arc<dyn ResourceSource>,
        workers: usize,
    ) -> io::Result<Self> {
        let requests = plan_requests(roster);
        let mut tracker = LoadTracker::new();
        tracker.register(requests.len());
        info!(assets = requests.len(), workers, "开始加载资源");

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let queue = Arc::new(Mutex::new(job_rx));
        for i in 0..workers.max(1).min(requests.len().max(1)) {
            let queue = Arc::clone(&queue);
            let source = Arc::clone(&source);
            thread::Builder::new()
                .name(format!("asset-loader-{i}"))
                .spawn(move || worker_loop(queue, source))?;
        }

        for request in requests {
            debug!(path = %request.path, "派发资源请求");
            // 接收端由工作线程持有，发送只会在全部线程退出后失败
            let _ = job_tx.send((request, tracker.handle()));
        }

        Ok(Self {
            tracker,
            initialized: false,
        })
    }

    /// 应用已结算的结果并返回当前状态
    ///
    /// 本次调用跨入 Ready 时初始化名册中的所有角色。
    pub fn pump(&mut self, roster: &mut Roster) -> LoadStatus {
        let fired = self.tracker.drain(|asset| apply(roster, asset));
        if fired {
            self.finish(roster);
        }
        self.status()
    }

    /// 阻塞直到全部资源结算
    ///
    /// 没有任何资源需要加载时直接返回，状态保持 Loading。
    pub fn wait_ready(&mut self, roster: &mut Roster) -> LoadStatus {
        if !self.tracker.wait_ready(|asset| apply(roster, asset)) {
            warn!("没有需要加载的资源");
            return self.status();
        }
        if !self.initialized {
            self.finish(roster);
        }
        self.status()
    }

    fn finish(&mut self, roster: &mut Roster) {
        roster.initialize_all();
        self.initialized = true;
        let progress = self.tracker.progress();
        info!(assets = progress.expected, "资源加载完成，角色已初始化");
    }

    pub fn status(&self) -> LoadStatus {
        if self.tracker.is_ready() {
            LoadStatus::Ready
        } else {
            let LoadProgress {
                completed,
                expected,
            } = self.tracker.progress();
            LoadStatus::Loading {
                completed,
                expected,
            }
        }
    }

    pub fn progress(&self) -> LoadProgress {
        self.tracker.progress()
    }
}
