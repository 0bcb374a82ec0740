//! # アプリケーション構築
//!
//! State の初期化とルーター構築を担当する。
//! `main.rs` は設定読み込みとサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sweeper_domain::run::RunGuard;
use sweeper_infra::RecordSourceFactory;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{DeletionState, get_status, health_check, progress_ws, start_deletion},
    progress_hub::ProgressHub,
    usecase::{DeletionSettings, DeletionUseCaseImpl},
};

/// ルーターを構築する
///
/// RunGuard はここで 1 つだけ生成し、プロセス内の全リクエストで共有する。
pub fn build_router(
    source_factory: Arc<dyn RecordSourceFactory>,
    hub: ProgressHub,
    settings: DeletionSettings,
) -> Router {
    let run_guard = Arc::new(RunGuard::new());
    let deletion_state = Arc::new(DeletionState {
        usecase: DeletionUseCaseImpl::new(source_factory, hub.clone(), run_guard, settings),
        hub,
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/deletions", post(start_deletion))
        .route("/api/v1/deletions/status", get(get_status))
        .route("/ws", get(progress_ws))
        .with_state(deletion_state)
        .layer(TraceLayer::new_for_http())
}
