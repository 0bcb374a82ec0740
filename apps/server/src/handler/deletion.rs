//! # 削除ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/deletions` - 削除実行を開始する（完了は待たない）
//! - `GET /api/v1/deletions/status` - 実行状態と最新の進捗を返す

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sweeper_domain::{progress::ProgressSnapshot, run::RunState};
use sweeper_shared::ApiResponse;

use super::SharedDeletionState;
use crate::{
    error::DeletionError,
    progress_hub::ProgressHubError,
    usecase::RunHandle,
};

// --- リクエスト/レスポンス型 ---

/// 削除開始リクエスト
#[derive(Debug, Deserialize)]
pub struct StartDeletionRequest {
    pub token:       String,
    pub database_id: String,
}

/// 削除開始レスポンス
#[derive(Debug, Serialize)]
pub struct StartDeletionData {
    pub accepted: bool,
}

/// 実行状態レスポンス
#[derive(Debug, Serialize)]
pub struct DeletionStatusData {
    pub state:    RunState,
    pub progress: ProgressSnapshot,
}

// --- ハンドラ ---

/// POST /api/v1/deletions
///
/// 実行を受け付けたら 202 を返す。実行中なら 409。
#[tracing::instrument(skip_all)]
pub async fn start_deletion(
    State(state): State<SharedDeletionState>,
    Json(req): Json<StartDeletionRequest>,
) -> Result<impl IntoResponse, DeletionError> {
    let handle = state.usecase.start_run(&req.token, &req.database_id)?;
    tokio::spawn(report_interruption(handle));

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(StartDeletionData { accepted: true })),
    ))
}

/// GET /api/v1/deletions/status
#[tracing::instrument(skip_all)]
pub async fn get_status(
    State(state): State<SharedDeletionState>,
) -> Result<impl IntoResponse, ProgressHubError> {
    let progress = state.hub.last().await?;

    Ok(Json(ApiResponse::new(DeletionStatusData {
        state: state.usecase.run_state(),
        progress,
    })))
}

/// 実行タスクの異常終了を記録する
///
/// 正常終了・失敗のログは実行タスク側で出力済み。
async fn report_interruption(handle: RunHandle) {
    if let Err(DeletionError::Interrupted(reason)) = handle.wait().await {
        tracing::error!(reason = %reason, "削除処理が異常終了しました");
    }
}
