//! # Worker
//!
//! ID キューから 1 件ずつ受け取り、許可を得てからアーカイブする。
//!
//! ```text
//! recv(id) ──▶ acquire() ──▶ remove(id) ──成功──▶ publish(snapshot) ──┐
//!    ▲                                      │                          │
//!    └──────────────────────────────────────┼──────────────────────────┘
//!                                           └─失敗─▶ first_error に記録、cancel、終了
//! ```
//!
//! キューの受信と許可待ちはキャンセルと競合させる。
//! 実行中の `remove` は中断しない。

use std::sync::{
    Arc,
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

use sweeper_domain::{progress::ProgressSnapshot, record::RecordId};
use sweeper_infra::{RecordSource, RecordSourceError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::rate_limiter::RateLimiter;
use crate::progress_hub::ProgressHub;

/// 何件ごとに info ログを出すか
const MILESTONE_INTERVAL: u64 = 100;

/// 1 回の実行でワーカー全員が共有する状態
pub(super) struct WorkerContext {
    pub source:      Arc<dyn RecordSource>,
    pub queue:       async_channel::Receiver<RecordId>,
    pub limiter:     RateLimiter,
    pub hub:         ProgressHub,
    pub deleted:     AtomicU64,
    pub total:       u64,
    pub started_at:  Instant,
    /// 最初に発生したエラー（2 件目以降は捨てる）
    pub first_error: OnceLock<RecordSourceError>,
    pub cancel:      CancellationToken,
}

pub(super) async fn run_worker(worker_id: usize, ctx: Arc<WorkerContext>) {
    loop {
        let id = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            received = ctx.queue.recv() => match received {
                Ok(id) => id,
                // クローズ済みかつ空
                Err(_) => break,
            },
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            _ = ctx.limiter.acquire() => {}
        }

        match ctx.source.remove(&id).await {
            Ok(()) => {
                let deleted = ctx.deleted.fetch_add(1, Ordering::AcqRel) + 1;
                if deleted % MILESTONE_INTERVAL == 0 {
                    tracing::info!(deleted, total = ctx.total, "アーカイブ進捗");
                }
                ctx.hub
                    .publish(ProgressSnapshot::archiving(
                        deleted,
                        ctx.total,
                        ctx.started_at.elapsed(),
                    ))
                    .await;
            }
            Err(err) => {
                tracing::debug!(worker_id, record_id = %id, error = %err, "アーカイブに失敗しました");
                if let Err(later) = ctx.first_error.set(err) {
                    tracing::debug!(worker_id, error = %later, "2 件目以降のエラーは破棄します");
                }
                ctx.cancel.cancel();
                break;
            }
        }
    }

    tracing::debug!(worker_id, "ワーカーを終了しました");
}
