//! # Sweeper サーバーエラー定義
//!
//! 削除ユースケースのエラーと、HTTP レスポンスへの変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sweeper_domain::DomainError;
use sweeper_infra::RecordSourceError;
use sweeper_shared::ErrorResponse;
use thiserror::Error;

use crate::{progress_hub::ProgressHubError, usecase::deletion::CollectError};

/// 削除ユースケースで発生するエラー
#[derive(Debug, Error)]
pub enum DeletionError {
    /// 入力値が不正（実行は開始していない）
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// 既に実行中
    #[error("削除処理は既に実行中です")]
    Conflict,

    /// 列挙に失敗した（アーカイブは 1 件も行っていない）
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// アーカイブ中に失敗した
    #[error("アーカイブに失敗しました（{deleted} 件完了）: {source}")]
    Archive {
        deleted: u64,
        source:  RecordSourceError,
    },

    /// 実行タスクがパニック等で中断された
    #[error("削除処理が中断されました: {0}")]
    Interrupted(String),
}

impl IntoResponse for DeletionError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            DeletionError::Validation(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::validation_error(msg.clone()),
            ),
            DeletionError::Conflict => (
                StatusCode::CONFLICT,
                ErrorResponse::conflict(self.to_string()),
            ),
            DeletionError::Collect(_)
            | DeletionError::Archive { .. }
            | DeletionError::Interrupted(_) => {
                tracing::error!(
                    error.category = "deletion",
                    "削除処理で内部エラー: {}",
                    self
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ProgressHubError {
    fn into_response(self) -> Response {
        tracing::error!(error.category = "progress_hub", "{}", self);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::service_unavailable(self.to_string())),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(
        DeletionError::Validation(DomainError::Validation("トークンを入力してください".to_string())),
        StatusCode::BAD_REQUEST
    )]
    #[case(DeletionError::Conflict, StatusCode::CONFLICT)]
    #[case(
        DeletionError::Archive {
            deleted: 3,
            source:  RecordSourceError::Transport("timeout".to_string()),
        },
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(
        DeletionError::Interrupted("panicked".to_string()),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_エラー種別ごとのステータスコード(
        #[case] error: DeletionError,
        #[case] expected: StatusCode,
    ) {
        assert_eq!(error.into_response().status(), expected);
    }

    #[tokio::test]
    async fn test_validationエラーはメッセージをdetailに含める() {
        let error =
            DeletionError::Validation(DomainError::Validation("トークンを入力してください".to_string()));

        let json = body_json(error.into_response()).await;

        assert_eq!(json["status"], 400);
        assert_eq!(json["detail"], "トークンを入力してください");
    }

    #[tokio::test]
    async fn test_内部エラーはリモートの詳細を返さない() {
        let error = DeletionError::Archive {
            deleted: 1,
            source:  RecordSourceError::Remote {
                operation: "archive",
                status:    401,
                body:      "unauthorized: secret_abc".to_string(),
            },
        };

        let json = body_json(error.into_response()).await;

        assert_eq!(json["detail"], "内部エラーが発生しました");
        assert!(!json.to_string().contains("secret_abc"));
    }

    #[test]
    fn test_hub停止は503() {
        assert_eq!(
            ProgressHubError::Closed.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
