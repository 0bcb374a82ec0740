//! # 削除ユースケース
//!
//! 1 回の削除実行（Run）を組み立てて、バックグラウンドで走らせる。
//!
//! ## 実行の流れ
//!
//! ```text
//! start_run
//!   ├─ 入力検証            → Validation
//!   ├─ RunGuard のリース取得 → Conflict
//!   └─ spawn ─▶ Collecting ──失敗──▶ finished(0, 取得済み件数) → Collect
//!                   │
//!                   ▼
//!               started(total)
//!                   │
//!               Archiving（N ワーカー + 共有 RateLimiter）
//!                   │
//!               finished(deleted, total) → RunReport / Archive
//! ```
//!
//! RunGuard のリースは実行タスクが所有し、どの経路で終わっても drop で解放される。

mod collector;
mod rate_limiter;
mod worker;

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

pub use collector::{CollectError, collect_all};
pub use rate_limiter::{ARCHIVE_RATE_PERIOD, RateLimiter};
use sweeper_domain::{
    credentials::{ApiToken, DatabaseId},
    progress::ProgressSnapshot,
    record::RecordId,
    run::{RunGuard, RunPhase, RunState},
};
use sweeper_infra::{RecordSource, RecordSourceFactory};
use tokio::{task::JoinSet, time::Instant};
use tokio_util::sync::CancellationToken;
use worker::{WorkerContext, run_worker};

use crate::{error::DeletionError, progress_hub::ProgressHub};

/// ID キューの容量
pub const ID_QUEUE_CAPACITY: usize = 200;

/// ワーカー数の下限
pub const MIN_WORKERS: usize = 4;

/// 実行パラメータ
#[derive(Debug, Clone)]
pub struct DeletionSettings {
    pub worker_count:   usize,
    pub queue_capacity: usize,
}

impl Default for DeletionSettings {
    fn default() -> Self {
        Self {
            worker_count:   default_worker_count(),
            queue_capacity: ID_QUEUE_CAPACITY,
        }
    }
}

/// `max(4, 利用可能な並列度)`
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .max(MIN_WORKERS)
}

/// 正常終了した実行の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub deleted: u64,
    pub total:   u64,
}

/// バックグラウンド実行のハンドル
///
/// drop しても実行は止まらない。
#[derive(Debug)]
pub struct RunHandle {
    inner: tokio::task::JoinHandle<Result<RunReport, DeletionError>>,
}

impl RunHandle {
    /// 実行の終了を待って結果を返す
    pub async fn wait(self) -> Result<RunReport, DeletionError> {
        match self.inner.await {
            Ok(result) => result,
            Err(join_error) => Err(DeletionError::Interrupted(join_error.to_string())),
        }
    }
}

/// 削除ユースケース実装
pub struct DeletionUseCaseImpl {
    source_factory: Arc<dyn RecordSourceFactory>,
    hub:            ProgressHub,
    run_guard:      Arc<RunGuard>,
    settings:       DeletionSettings,
}

impl DeletionUseCaseImpl {
    pub fn new(
        source_factory: Arc<dyn RecordSourceFactory>,
        hub: ProgressHub,
        run_guard: Arc<RunGuard>,
        settings: DeletionSettings,
    ) -> Self {
        Self {
            source_factory,
            hub,
            run_guard,
            settings,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_guard.state()
    }

    /// 削除実行を開始する
    ///
    /// 実行中なら待たずに [`DeletionError::Conflict`] を返す。
    /// 受け付けた実行はバックグラウンドで進み、戻り値のハンドルで結果を待てる。
    pub fn start_run(&self, token: &str, database_id: &str) -> Result<RunHandle, DeletionError> {
        let token = ApiToken::new(token)?;
        let database_id = DatabaseId::new(database_id)?;

        let Some(lease) = self.run_guard.try_lease() else {
            tracing::warn!("削除処理が実行中のため新しい実行を拒否しました");
            return Err(DeletionError::Conflict);
        };

        tracing::info!(database_id = %database_id, "削除処理を受け付けました");
        let run = DeletionRun {
            source:   self.source_factory.create(token, database_id),
            hub:      self.hub.clone(),
            settings: self.settings.clone(),
        };
        let inner = tokio::spawn(async move {
            let _lease = lease;
            run.execute().await
        });

        Ok(RunHandle { inner })
    }
}

/// 1 回の実行が所有するリソース
struct DeletionRun {
    source:   Arc<dyn RecordSource>,
    hub:      ProgressHub,
    settings: DeletionSettings,
}

impl DeletionRun {
    async fn execute(self) -> Result<RunReport, DeletionError> {
        tracing::info!(phase = %RunPhase::Collecting, "レコードを列挙します");
        let ids = match collect_all(self.source.as_ref()).await {
            Ok(ids) => ids,
            Err(err) => {
                self.hub
                    .publish(ProgressSnapshot::finished(0, err.collected.len() as u64))
                    .await;
                tracing::error!(phase = %RunPhase::Failed, error = %err, "列挙に失敗したため中止します");
                return Err(err.into());
            }
        };

        let total = ids.len() as u64;
        self.hub.publish(ProgressSnapshot::started(total)).await;
        tracing::info!(
            phase = %RunPhase::Archiving,
            total,
            workers = self.settings.worker_count,
            "アーカイブを開始します"
        );

        let (deleted, outcome) = self.archive_all(ids, total).await;

        self.hub
            .publish(ProgressSnapshot::finished(deleted, total))
            .await;

        match outcome {
            Ok(()) => {
                tracing::info!(phase = %RunPhase::Completed, deleted, total, "削除処理が完了しました");
                Ok(RunReport { deleted, total })
            }
            Err(err) => {
                tracing::error!(phase = %RunPhase::Failed, deleted, total, error = %err, "削除処理が失敗しました");
                Err(err)
            }
        }
    }

    /// ワーカープールで全件アーカイブし、成功件数と結果を返す
    async fn archive_all(&self, ids: Vec<RecordId>, total: u64) -> (u64, Result<(), DeletionError>) {
        let (tx, rx) = async_channel::bounded(self.settings.queue_capacity.max(1));
        let ctx = Arc::new(WorkerContext {
            source: Arc::clone(&self.source),
            queue: rx,
            limiter: RateLimiter::new(ARCHIVE_RATE_PERIOD),
            hub: self.hub.clone(),
            deleted: AtomicU64::new(0),
            total,
            started_at: Instant::now(),
            first_error: OnceLock::new(),
            cancel: CancellationToken::new(),
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..self.settings.worker_count.max(1) {
            workers.spawn(run_worker(worker_id, Arc::clone(&ctx)));
        }

        for id in ids {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                sent = tx.send(id) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        tx.close();

        let mut panicked = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(join_error) = joined {
                tracing::error!(error = %join_error, "ワーカーが異常終了しました");
                ctx.cancel.cancel();
                panicked.get_or_insert(join_error.to_string());
            }
        }

        let deleted = ctx.deleted.load(Ordering::Acquire);
        let outcome = match (ctx.first_error.get(), panicked) {
            (Some(source), _) => Err(DeletionError::Archive {
                deleted,
                source: source.clone(),
            }),
            (None, Some(reason)) => Err(DeletionError::Interrupted(reason)),
            (None, None) => Ok(()),
        };
        (deleted, outcome)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sweeper_infra::mock::{InMemoryRecordSource, InMemoryRecordSourceFactory};

    use super::*;

    fn usecase(source: InMemoryRecordSource) -> (DeletionUseCaseImpl, Arc<RunGuard>) {
        let guard = Arc::new(RunGuard::new());
        let usecase = DeletionUseCaseImpl::new(
            Arc::new(InMemoryRecordSourceFactory::new(source)),
            ProgressHub::spawn(),
            Arc::clone(&guard),
            DeletionSettings {
                worker_count:   MIN_WORKERS,
                queue_capacity: ID_QUEUE_CAPACITY,
            },
        );
        (usecase, guard)
    }

    #[test]
    fn test_デフォルトのワーカー数は4以上() {
        assert!(default_worker_count() >= MIN_WORKERS);
        assert_eq!(DeletionSettings::default().queue_capacity, 200);
    }

    #[tokio::test]
    async fn test_空のトークンはvalidationエラーでガードを取得しない() {
        let (usecase, guard) = usecase(InMemoryRecordSource::with_count(1));

        let result = usecase.start_run("   ", "db-1");

        assert!(matches!(result, Err(DeletionError::Validation(_))));
        assert_eq!(guard.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_空のデータベースidはvalidationエラー() {
        let (usecase, _guard) = usecase(InMemoryRecordSource::with_count(1));

        let result = usecase.start_run("secret", "");

        assert!(matches!(result, Err(DeletionError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_空のコレクションはremoveを呼ばずに完了する() {
        let source = InMemoryRecordSource::with_count(0);
        let (usecase, guard) = usecase(source.clone());

        let report = usecase.start_run("secret", "db-1").unwrap().wait().await.unwrap();

        assert_eq!(report, RunReport {
            deleted: 0,
            total:   0,
        });
        assert!(source.remove_calls().is_empty());
        assert_eq!(guard.state(), RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_実行中はrun_stateがrunningになる() {
        let (usecase, _guard) = usecase(InMemoryRecordSource::with_count(3));

        let handle = usecase.start_run("secret", "db-1").unwrap();
        assert_eq!(usecase.run_state(), RunState::Running);

        handle.wait().await.unwrap();
        assert_eq!(usecase.run_state(), RunState::Idle);
    }
}
