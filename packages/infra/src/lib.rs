//! # Sweeper インフラ層
//!
//! アーカイブ対象のリモートコレクション（Record Source）との通信を担当する。
//!
//! ## 責務
//!
//! - **Record Source 契約**: ページング付き一覧取得と 1 件アーカイブの 2 操作
//! - **Notion 実装**: Notion REST API を `reqwest` で呼び出す
//! - **テスト用実装**: `test-utils` feature で公開するインメモリ実装
//!
//! ## モジュール構成
//!
//! - [`error`] - Record Source エラー
//! - [`record_source`] - トレイトと Notion 実装

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod record_source;

pub use error::RecordSourceError;
pub use record_source::{
    NotionRecordSource,
    NotionRecordSourceFactory,
    NotionSettings,
    RecordPage,
    RecordSource,
    RecordSourceFactory,
};
