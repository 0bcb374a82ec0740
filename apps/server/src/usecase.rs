//! # ユースケース層
//!
//! 削除実行のオーケストレーションを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: Record Source のファクトリ・RunGuard・Progress Hub を外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `deletion`: 列挙・レート制限・ワーカープール・実行制御

pub mod deletion;

pub use deletion::{DeletionSettings, DeletionUseCaseImpl, RunHandle, RunReport};
