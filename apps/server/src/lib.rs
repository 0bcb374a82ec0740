//! # Sweeper サーバーライブラリ
//!
//! リモートコレクションの全レコードを一括アーカイブし、進捗を配信するサーバーのコア。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーター構築
//! - `error`: ユースケースエラーと HTTP レスポンスへの変換
//! - `handler`: HTTP / WebSocket ハンドラ
//! - `progress_hub`: 進捗スナップショットの配信アクター
//! - `usecase`: 削除実行のオーケストレーション

pub mod app_builder;
pub mod error;
pub mod handler;
pub mod progress_hub;
pub mod usecase;
