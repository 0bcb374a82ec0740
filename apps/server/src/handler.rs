//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ロジックはユースケースと Progress Hub に委譲

pub mod deletion;
pub mod health;
pub mod progress;

use std::sync::Arc;

pub use deletion::{get_status, start_deletion};
pub use health::health_check;
pub use progress::progress_ws;

use crate::{progress_hub::ProgressHub, usecase::DeletionUseCaseImpl};

/// 削除 API と進捗配信の共有状態
pub struct DeletionState {
    pub usecase: DeletionUseCaseImpl,
    pub hub:     ProgressHub,
}

pub type SharedDeletionState = Arc<DeletionState>;
