//! # 実行状態と単一実行ガード
//!
//! プロセス全体で同時に走る削除実行を高々 1 つに制限する。
//!
//! ## 状態遷移
//!
//! ```text
//! Idle ──try_acquire 成功──▶ Running ──release──▶ Idle
//!                              │
//!                    try_acquire は false（待ち合わせしない）
//! ```
//!
//! 実行中の詳細な段階は [`RunPhase`] で表し、ログ出力に使う。

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde::Serialize;
use strum::IntoStaticStr;

/// ガードが保持する実行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
}

/// 1 回の実行の段階
///
/// `Idle → Collecting → Archiving → {Completed | Failed} → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunPhase {
    Idle,
    /// 全レコード ID を列挙中
    Collecting,
    /// ワーカーがアーカイブ中
    Archiving,
    Completed,
    Failed,
}

/// 単一実行ガード
///
/// 状態は 1 つのアトミックフラグのみで持つ。オーケストレーターに注入して使い、
/// グローバル変数として参照しない。
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle → Running への遷移を試みる
    ///
    /// 既に Running なら `false` を返し、状態は変えない。
    pub fn try_acquire(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Running → Idle に戻す
    ///
    /// 実行の結果にかかわらず必ず呼ぶこと。Idle での呼び出しは何もしない。
    pub fn release(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// 取得に成功した場合、drop 時に自動で解放されるリースを返す
    ///
    /// バックグラウンドタスクへ所有権ごと渡せるよう `Arc` で受け取る。
    /// エラー終了やパニックでも drop は走るため、Running のまま残ることはない。
    pub fn try_lease(self: &Arc<Self>) -> Option<RunLease> {
        self.try_acquire().then(|| RunLease {
            guard: Arc::clone(self),
        })
    }
}

/// 実行中であることを表すリース
#[derive(Debug)]
pub struct RunLease {
    guard: Arc<RunGuard>,
}

impl Drop for RunLease {
    fn drop(&mut self) {
        self.guard.release();
    }
}
