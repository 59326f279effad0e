//! # Server 模块
//!
//! 只读 HTTP 服务：名册、台词库与图像资源。
//!
//! ```text
//! GET /api/units                          名册描述（JSON）
//! GET /api/dialogue                       台词库（JSON）
//! GET /assets/{element}/{file}            例如 HealthBar/HealthBar.png
//! GET /assets/{character}/{action}/{file} 角色动作帧
//! ```
//!
//! 越界路径返回 403，不存在返回 404，其余读取失败返回 500。

use std::io;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use gallery_runtime::{DialogueBank, UnitDescriptor};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::data::GalleryData;
use crate::resources::{ResourceError, resolve_asset_path};

/// 服务共享状态（启动后只读）
#[derive(Clone)]
pub struct ServerState {
    units: Arc<Vec<UnitDescriptor>>,
    dialogue: Arc<DialogueBank>,
    assets_root: Arc<PathBuf>,
}

impl ServerState {
    pub fn new(data: GalleryData, assets_root: impl Into<PathBuf>) -> Self {
        Self {
            units: Arc::new(data.units),
            dialogue: Arc::new(data.dialogue),
            assets_root: Arc::new(assets_root.into()),
        }
    }
}

/// 构建路由
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/units", get(units))
        .route("/api/dialogue", get(dialogue))
        .route("/assets/{element}/{file}", get(element_asset))
        .route("/assets/{character}/{action}/{file}", get(frame_asset))
        .with_state(state)
}

/// 阻塞运行服务直到出错
pub fn serve(config: &AppConfig, state: ServerState) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;
    let address = config.bind_address();

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&address).await?;
        info!(address = %address, "资源服务已启动");
        axum::serve(listener, router(state)).await
    })
}

async fn units(State(state): State<ServerState>) -> Json<Vec<UnitDescriptor>> {
    Json(state.units.as_ref().clone())
}

async fn dialogue(State(state): State<ServerState>) -> Json<DialogueBank> {
    Json(state.dialogue.as_ref().clone())
}

async fn element_asset(
    State(state): State<ServerState>,
    Path((element, file)): Path<(String, String)>,
) -> Response {
    serve_file(&state.assets_root, &[&element, &file])
}

async fn frame_asset(
    State(state): State<ServerState>,
    Path((character, action, file)): Path<(String, String, String)>,
) -> Response {
    serve_file(&state.assets_root, &[&character, &action, &file])
}

/// 读取资源根目录下的文件并生成响应
pub fn serve_file(root: &FsPath, segments: &[&str]) -> Response {
    let result = resolve_asset_path(root, segments).and_then(|path| {
        std::fs::read(&path).map_err(|e| ResourceError::from_io(path.to_string_lossy(), "file", e))
    });

    match result {
        Ok(bytes) => {
            debug!(path = %segments.join("/"), "发送资源");
            let mime = content_type(segments.last().copied().unwrap_or_default());
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(e) => {
            warn!(path = %segments.join("/"), error = %e, "资源请求失败");
            let status = status_for(&e);
            (status, status.canonical_reason().unwrap_or_default()).into_response()
        }
    }
}

/// 错误对应的 HTTP 状态码
pub fn status_for(err: &ResourceError) -> StatusCode {
    match err {
        ResourceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ResourceError::LoadFailed { .. } | ResourceError::InvalidFormat { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 按扩展名推断内容类型
pub fn content_type(file: &str) -> &'static str {
    let ext = file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_file_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("HealthBar")).unwrap();
        std::fs::write(dir.path().join("HealthBar/HealthBar.png"), b"png").unwrap();

        let ok = serve_file(dir.path(), &["HealthBar", "HealthBar.png"]);
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()[header::CONTENT_TYPE], "image/png");

        let missing = serve_file(dir.path(), &["HealthBar", "nope.png"]);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let forbidden = serve_file(dir.path(), &["..", "secret.txt"]);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.PNG"), "image/png");
        assert_eq!(content_type("a.jpeg"), "image/jpeg");
        assert_eq!(content_type("noext"), "application/octet-stream");
    }

    #[test]
    fn test_api_handlers() {
        let mut data = GalleryData::default();
        data.dialogue.insert("Alpha", Default::default());
        let state = ServerState::new(data, "unused");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let Json(units) = runtime.block_on(units(State(state.clone())));
        assert!(units.is_empty());
        let Json(bank) = runtime.block_on(dialogue(State(state)));
        assert_eq!(bank.len(), 1);
    }
}
