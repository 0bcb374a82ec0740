//! # Rate Limiter
//!
//! 全ワーカーで共有する許可（permit）の発行元。
//!
//! 周期 P ごとに 1 つの tick を発行し、各 tick はちょうど 1 ワーカーが消費する。
//! 取りこぼした tick はまとめて発行せず遅延させるため、
//! アーカイブの開始間隔がワーカー数にかかわらず P を下回ることはない。

use std::time::Duration;

use tokio::{
    sync::Mutex,
    time::{Instant, Interval, MissedTickBehavior},
};

/// アーカイブ開始間隔（Notion API の 3 リクエスト/秒 制限に合わせた値）
pub const ARCHIVE_RATE_PERIOD: Duration = Duration::from_millis(350);

/// 共有レートリミッター
#[derive(Debug)]
pub struct RateLimiter {
    interval: Mutex<Interval>,
}

impl RateLimiter {
    /// 最初の許可は生成から `period` 後に発行される
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval: Mutex::new(interval),
        }
    }

    /// 次の許可を待つ
    ///
    /// キャンセルセーフ。`select!` で中断されても tick は消費されない。
    pub async fn acquire(&self) {
        self.interval.lock().await.tick().await;
    }
}
