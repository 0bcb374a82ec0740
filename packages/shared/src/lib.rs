//! # Sweeper 共有ユーティリティ
//!
//! サーバー・インフラ層から共通で利用されるユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などのフレームワークには依存しない（レスポンス変換は各アプリの責務）
//! - トレーシング初期化は `observability` feature 有効時のみコンパイルする

pub mod api_response;
pub mod error_response;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
