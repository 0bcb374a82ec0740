//! # 進捗スナップショット
//!
//! 実行中の進捗を購読者へ配信するための不変値。
//! 1 件アーカイブするごと、および実行の開始時・終了時に 1 つ生成される。
//!
//! 複数ワーカーから並行に生成されるため、スナップショット間の全順序は保証しない。
//! 権威ある値は Progress Hub が最後に受け取ったもの（last-write-wins）である。

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 進捗スナップショット
///
/// JSON では `running`, `deleted`, `total`, `etaSeconds` の 4 キーで表現する。
/// `Default` は未実行状態（すべて 0、`running: false`）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub running:     bool,
    pub deleted:     u64,
    pub total:       u64,
    pub eta_seconds: u64,
}

impl ProgressSnapshot {
    /// 全件の列挙が終わり、アーカイブを始める直前のスナップショット
    pub fn started(total: u64) -> Self {
        Self {
            running: true,
            deleted: 0,
            total,
            eta_seconds: 0,
        }
    }

    /// 1 件アーカイブした直後のスナップショット
    ///
    /// `elapsed` はワーカープール起動からの経過時間。
    pub fn archiving(deleted: u64, total: u64, elapsed: Duration) -> Self {
        Self {
            running: true,
            deleted,
            total,
            eta_seconds: estimate_eta_seconds(deleted, total, elapsed),
        }
    }

    /// 実行終了（成功・失敗とも）のスナップショット
    pub fn finished(deleted: u64, total: u64) -> Self {
        Self {
            running: false,
            deleted,
            total,
            eta_seconds: 0,
        }
    }
}

/// 残り時間（秒）を見積もる
///
/// `rate = deleted / elapsed` とし、`(total - deleted) / rate` を秒に切り捨てる。
/// 経過時間・処理件数・残件数のいずれかが 0 のときは 0 を返す。
///
/// ```
/// use std::time::Duration;
///
/// use sweeper_domain::progress::estimate_eta_seconds;
///
/// // 10 秒で 5 件 → 0.5 件/秒、残り 15 件で 30 秒
/// assert_eq!(estimate_eta_seconds(5, 20, Duration::from_secs(10)), 30);
/// assert_eq!(estimate_eta_seconds(0, 20, Duration::from_secs(10)), 0);
/// ```
pub fn estimate_eta_seconds(deleted: u64, total: u64, elapsed: Duration) -> u64 {
    let elapsed_secs = elapsed.as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        deleted as f64 / elapsed_secs
    } else {
        0.0
    };
    let remaining = total.saturating_sub(deleted);

    if rate > 0.0 && remaining > 0 {
        (remaining as f64 / rate) as u64
    } else {
        0
    }
}
