//! # Sweeper ドメイン層
//!
//! 一括アーカイブ処理の中核となる値と規則を定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! server → infra → domain
//! ```
//!
//! ドメイン層は HTTP クライアントや非同期ランタイムに依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメインエラー
//! - [`record`] - アーカイブ対象レコードの識別子
//! - [`credentials`] - 実行ごとに受け取る API トークンとデータベース ID
//! - [`progress`] - 進捗スナップショットと残り時間の見積もり
//! - [`run`] - 実行状態と単一実行ガード

#[macro_use]
mod macros;

pub mod credentials;
pub mod error;
pub mod progress;
pub mod record;
pub mod run;

pub use error::DomainError;
