//! # Record Source
//!
//! 削除オーケストレーターが依存するリモートコレクションの契約。
//!
//! - `list(cursor)` - ID をページ単位で取得する
//! - `remove(id)` - 1 件をアーカイブ（論理削除）する
//!
//! 状態を持たない純粋なリクエスト/レスポンスであり、リトライもしない。
//! トークンとデータベース ID は実行ごとに異なるため、
//! [`RecordSourceFactory`] が実行単位でインスタンスを組み立てる。

mod notion;
mod response;

use std::sync::Arc;

use async_trait::async_trait;
pub use notion::{NotionRecordSource, NotionRecordSourceFactory, NotionSettings};
use sweeper_domain::{
    credentials::{ApiToken, DatabaseId},
    record::RecordId,
};

use crate::error::RecordSourceError;

/// 一覧取得 1 回分の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    /// ページ内の ID（リモートの並び順）
    pub ids:         Vec<RecordId>,
    pub has_more:    bool,
    /// 次ページ取得用のカーソル（最終ページでは `None`）
    pub next_cursor: Option<String>,
}

/// Record Source トレイト
///
/// テスト時にインメモリ実装へ差し替えられるようトレイトで定義する。
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// `cursor` 以降の 1 ページを取得する
    ///
    /// 先頭ページは `cursor = None` で取得する。
    async fn list(&self, cursor: Option<&str>) -> Result<RecordPage, RecordSourceError>;

    /// 1 件アーカイブする
    async fn remove(&self, id: &RecordId) -> Result<(), RecordSourceError>;
}

/// 実行ごとの Record Source を生成するファクトリ
pub trait RecordSourceFactory: Send + Sync {
    fn create(&self, token: ApiToken, database_id: DatabaseId) -> Arc<dyn RecordSource>;
}
