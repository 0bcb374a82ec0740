//! 削除実行の統合テスト
//!
//! インメモリの Record Source を使い、Tokio の仮想時間上で
//! 実行全体（列挙 → レート制限付きアーカイブ → 進捗配信）を検証する。
//!
//! ## 実行方法
//!
//! ```bash
//! cargo test -p sweeper-server --test deletion_run_test
//! ```
//!
//! ## テストケース
//!
//! - 失敗がなければ全件を 1 回ずつアーカイブする
//! - アーカイブの開始間隔はレート周期を下回らない
//! - K 件目で失敗すると K ～ K + N - 1 回で止まる
//! - キューが詰まっている間に失敗すると投入を打ち切って終了する
//! - 実行中の 2 回目の開始は Conflict になり、実行中の処理に影響しない
//! - 途中から購読した購読者は最新状態を受け取り、以後の進捗も受け取る
//! - 250 件の実行時間は 250 × P 以上
//! - 列挙に失敗したらアーカイブせずに中止する

use std::{collections::HashSet, sync::Arc, time::Duration};

use pretty_assertions::assert_eq;
use rstest::rstest;
use sweeper_domain::{
    progress::ProgressSnapshot,
    record::RecordId,
    run::{RunGuard, RunState},
};
use sweeper_infra::mock::{InMemoryRecordSource, InMemoryRecordSourceFactory};
use sweeper_server::{
    error::DeletionError,
    progress_hub::ProgressHub,
    usecase::{
        DeletionSettings,
        DeletionUseCaseImpl,
        deletion::{ARCHIVE_RATE_PERIOD, ID_QUEUE_CAPACITY},
    },
};
use tokio::time::Instant;

const WORKERS: usize = 4;

struct Fixture {
    usecase: DeletionUseCaseImpl,
    hub:     ProgressHub,
    guard:   Arc<RunGuard>,
    factory: InMemoryRecordSourceFactory,
}

fn fixture(source: InMemoryRecordSource) -> Fixture {
    fixture_with(source, DeletionSettings {
        worker_count:   WORKERS,
        queue_capacity: ID_QUEUE_CAPACITY,
    })
}

fn fixture_with(source: InMemoryRecordSource, settings: DeletionSettings) -> Fixture {
    let hub = ProgressHub::spawn();
    let guard = Arc::new(RunGuard::new());
    let factory = InMemoryRecordSourceFactory::new(source);
    let usecase = DeletionUseCaseImpl::new(
        Arc::new(factory.clone()),
        hub.clone(),
        Arc::clone(&guard),
        settings,
    );
    Fixture {
        usecase,
        hub,
        guard,
        factory,
    }
}

#[tokio::test(start_paused = true)]
async fn test_失敗がなければ全件を1回ずつアーカイブする() {
    let source = InMemoryRecordSource::with_count(30).page_size(7);
    let fx = fixture(source.clone());

    let report = fx
        .usecase
        .start_run("secret_abc", "db-1")
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.deleted, 30);
    assert_eq!(report.total, 30);

    let removed = source.removed_ids();
    assert_eq!(removed.len(), 30);
    let unique: HashSet<RecordId> = removed.into_iter().collect();
    let expected: HashSet<RecordId> = (0..30)
        .map(|i| RecordId::new(format!("record-{i}")))
        .collect();
    assert_eq!(unique, expected);

    assert_eq!(fx.hub.last().await, Ok(ProgressSnapshot::finished(30, 30)));
    assert_eq!(fx.guard.state(), RunState::Idle);
    assert_eq!(fx.factory.credentials(), vec![(
        "secret_abc".to_string(),
        "db-1".to_string()
    )]);
}

#[tokio::test(start_paused = true)]
async fn test_アーカイブの開始間隔はレート周期を下回らない() {
    let source = InMemoryRecordSource::with_count(20).remove_latency(Duration::from_millis(50));
    let fx = fixture(source.clone());

    fx.usecase
        .start_run("secret", "db-1")
        .unwrap()
        .wait()
        .await
        .unwrap();

    let mut starts: Vec<Instant> = source.remove_calls().into_iter().map(|c| c.at).collect();
    starts.sort();
    assert_eq!(starts.len(), 20);
    for pair in starts.windows(2) {
        assert!(
            pair[1] - pair[0] >= ARCHIVE_RATE_PERIOD,
            "開始間隔が短すぎる: {:?}",
            pair[1] - pair[0]
        );
    }
}

#[rstest]
#[case::即時に失敗(1, Duration::ZERO)]
#[case::途中で失敗(5, Duration::ZERO)]
#[case::実行中の呼び出しがある状態で失敗(5, Duration::from_secs(1))]
#[tokio::test(start_paused = true)]
async fn test_k件目で失敗するとkからk_plus_n_minus_1回で止まる(
    #[case] k: usize,
    #[case] latency: Duration,
) {
    let source = InMemoryRecordSource::with_count(50)
        .fail_remove_at(k)
        .remove_latency(latency);
    let fx = fixture(source.clone());

    let result = fx.usecase.start_run("secret", "db-1").unwrap().wait().await;

    let calls = source.remove_calls().len();
    assert!(calls >= k, "呼び出し回数 {calls} < {k}");
    assert!(calls < k + WORKERS, "呼び出し回数 {calls} > {k} + {WORKERS} - 1");

    let deleted = match result {
        Err(DeletionError::Archive { deleted, .. }) => deleted,
        other => panic!("Archive エラーを期待したが {other:?} だった"),
    };
    assert_eq!(deleted, (calls - 1) as u64);

    let last = fx.hub.last().await.unwrap();
    assert!(!last.running);
    assert_eq!(last.deleted, deleted);
    assert_eq!(last.total, 50);
    assert_eq!(last.eta_seconds, 0);
    assert_eq!(fx.guard.state(), RunState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_キューが詰まっている間に失敗すると投入を打ち切って終了する() {
    const K: usize = 3;
    let source = InMemoryRecordSource::with_count(50).fail_remove_at(K);
    let fx = fixture_with(source.clone(), DeletionSettings {
        worker_count:   WORKERS,
        queue_capacity: 2,
    });

    let result = tokio::time::timeout(
        ARCHIVE_RATE_PERIOD * 50,
        fx.usecase.start_run("secret", "db-1").unwrap().wait(),
    )
    .await
    .expect("投入側が止まらず実行が終わらなかった");

    let calls = source.remove_calls().len();
    assert!(calls >= K, "呼び出し回数 {calls} < {K}");
    assert!(calls < K + WORKERS, "呼び出し回数 {calls} > {K} + {WORKERS} - 1");

    let deleted = match result {
        Err(DeletionError::Archive { deleted, .. }) => deleted,
        other => panic!("Archive エラーを期待したが {other:?} だった"),
    };
    assert_eq!(deleted, (calls - 1) as u64);

    let last = fx.hub.last().await.unwrap();
    assert!(!last.running);
    assert_eq!(last.deleted, deleted);
    assert_eq!(last.total, 50);
    assert_eq!(fx.guard.state(), RunState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_実行中の2回目の開始はconflictになり実行中の処理に影響しない() {
    let source = InMemoryRecordSource::with_count(10);
    let fx = fixture(source.clone());

    let handle = fx.usecase.start_run("secret", "db-1").unwrap();
    let second = fx.usecase.start_run("secret", "db-2");

    assert!(matches!(second, Err(DeletionError::Conflict)));
    assert_eq!(fx.usecase.run_state(), RunState::Running);

    let report = handle.wait().await.unwrap();
    assert_eq!(report.deleted, 10);
    assert_eq!(source.remove_calls().len(), 10);
    assert_eq!(fx.factory.credentials().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_終了後は再び実行を開始できる() {
    let source = InMemoryRecordSource::with_count(3).fail_remove_at(1);
    let fx = fixture(source.clone());

    let first = fx.usecase.start_run("secret", "db-1").unwrap().wait().await;
    assert!(first.is_err());

    let second = fx.usecase.start_run("secret", "db-1");
    assert!(second.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_途中から購読した購読者は最新状態と以後の進捗を受け取る() {
    let source = InMemoryRecordSource::with_count(20);
    let fx = fixture(source.clone());

    let handle = fx.usecase.start_run("secret", "db-1").unwrap();
    // 5 件程度アーカイブされるまで進める
    tokio::time::sleep(ARCHIVE_RATE_PERIOD * 5 + Duration::from_millis(10)).await;

    let mut subscription = fx.hub.register().await.unwrap();
    let report = handle.wait().await.unwrap();

    let first = subscription.recv().await.unwrap();
    assert!(first.running);
    assert_eq!(first.total, 20);
    assert!(first.deleted >= 1 && first.deleted < 20);

    let mut previous = first.deleted;
    let mut received = vec![first];
    while let Ok(Some(snapshot)) =
        tokio::time::timeout(Duration::from_millis(1), subscription.recv()).await
    {
        assert!(snapshot.deleted >= previous);
        previous = snapshot.deleted;
        received.push(snapshot);
        if !snapshot.running {
            break;
        }
    }

    assert_eq!(
        received.last().copied(),
        Some(ProgressSnapshot::finished(report.deleted, 20))
    );
    // 購読以降の 1 件ごとの進捗をすべて受け取っている
    let running_updates = received.iter().filter(|s| s.running).count() as u64;
    assert_eq!(running_updates, 20 - first.deleted + 1);
}

#[tokio::test(start_paused = true)]
async fn test_250件の実行時間は250周期以上() {
    let source = InMemoryRecordSource::with_count(250);
    let fx = fixture(source.clone());
    let started = Instant::now();

    let report = fx
        .usecase
        .start_run("secret", "db-1")
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.deleted, 250);
    assert!(started.elapsed() >= ARCHIVE_RATE_PERIOD * 250);
}

#[tokio::test(start_paused = true)]
async fn test_列挙に失敗したらアーカイブせずに中止する() {
    let source = InMemoryRecordSource::with_count(250)
        .page_size(100)
        .fail_list_at(1);
    let fx = fixture(source.clone());

    let result = fx.usecase.start_run("secret", "db-1").unwrap().wait().await;

    let err = match result {
        Err(DeletionError::Collect(err)) => err,
        other => panic!("Collect エラーを期待したが {other:?} だった"),
    };
    assert_eq!(err.collected.len(), 100);
    assert!(source.remove_calls().is_empty());
    assert_eq!(fx.hub.last().await, Ok(ProgressSnapshot::finished(0, 100)));
    assert_eq!(fx.guard.state(), RunState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_開始直後にtotal付きのスナップショットが配信される() {
    let source = InMemoryRecordSource::with_count(3);
    let fx = fixture(source);
    let mut subscription = fx.hub.register().await.unwrap();

    fx.usecase
        .start_run("secret", "db-1")
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(subscription.recv().await, Some(ProgressSnapshot::default()));
    assert_eq!(subscription.recv().await, Some(ProgressSnapshot::started(3)));
    for deleted in 1..=3 {
        let snapshot = subscription.recv().await.unwrap();
        assert_eq!(snapshot.deleted, deleted);
        assert!(snapshot.running);
    }
    let last = subscription.recv().await.unwrap();
    assert_eq!(last, ProgressSnapshot::finished(3, 3));
}
