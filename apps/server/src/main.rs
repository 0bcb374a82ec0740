//! # Sweeper サーバー
//!
//! Notion データベースの全ページを一括アーカイブし、進捗を WebSocket で配信する。
//!
//! ## アーキテクチャ
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────┐     ┌──────────────┐
//! │   Client     │────▶│         Sweeper          │────▶│  Notion API  │
//! │ (HTTP / WS)  │◀────│  port: 8080              │     │              │
//! └──────────────┘     └──────────────────────────┘     └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `SWEEPER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `SWEEPER_PORT` | No | ポート番号（デフォルト: `8080`） |
//! | `NOTION_API_URL` | No | Notion API のベース URL（デフォルト: `https://api.notion.com`） |
//! | `NOTION_VERSION` | No | `Notion-Version` ヘッダー（デフォルト: `2022-06-28`） |
//! | `NOTION_TIMEOUT_SECS` | No | 1 リクエストのタイムアウト秒数（デフォルト: `30`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//! | `RUST_LOG` | No | ログフィルタ（デフォルト: `info,sweeper=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! cargo run -p sweeper-server
//! ```

mod config;

use std::{net::SocketAddr, sync::Arc};

use config::ServerConfig;
use sweeper_infra::NotionRecordSourceFactory;
use sweeper_server::{app_builder::build_router, progress_hub::ProgressHub, usecase::DeletionSettings};
use sweeper_shared::observability::TracingConfig;
use tokio::net::TcpListener;

/// サーバーのエントリーポイント
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. 設定の読み込み
/// 4. Progress Hub とルーターの構築
/// 5. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    sweeper_shared::observability::init_tracing(&TracingConfig::from_env());
    let _tracing_guard = tracing::info_span!("app", service = "sweeper").entered();

    let config = ServerConfig::from_env()?;
    tracing::info!("Sweeper サーバーを起動します: {}:{}", config.host, config.port);

    let source_factory = Arc::new(NotionRecordSourceFactory::new(config.notion.clone())?);
    let settings = DeletionSettings::default();
    tracing::info!(workers = settings.worker_count, "ワーカー数を決定しました");

    let app = build_router(source_factory, ProgressHub::spawn(), settings);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Sweeper サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
