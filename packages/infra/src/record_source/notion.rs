//! # Notion Record Source
//!
//! Notion REST API に対する [`RecordSource`] 実装。
//!
//! ## エンドポイント
//!
//! - `POST /v1/databases/{database_id}/query` - データベース内のページ一覧（100 件ずつ）
//! - `PATCH /v1/pages/{page_id}` - `{"archived": true}` でページをアーカイブ
//!
//! 全リクエストに `Authorization: Bearer <token>` と `Notion-Version` ヘッダーを付与する。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sweeper_domain::{
    credentials::{ApiToken, DatabaseId},
    record::RecordId,
};

use super::{RecordPage, RecordSource, RecordSourceFactory, response::ensure_success};
use crate::error::RecordSourceError;

/// 1 回のクエリで取得するページ数（Notion API の上限）
const PAGE_SIZE: u32 = 100;

/// Notion API の接続設定
#[derive(Debug, Clone)]
pub struct NotionSettings {
    /// ベース URL（例: `https://api.notion.com`）
    pub base_url:       String,
    /// `Notion-Version` ヘッダーの値
    pub notion_version: String,
    /// 1 リクエストあたりのタイムアウト
    pub timeout:        Duration,
}

// --- ワイヤ型 ---

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size:    u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results:     Vec<PageRef>,
    #[serde(default)]
    has_more:    bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageRef {
    id: String,
}

#[derive(Debug, Serialize)]
struct ArchiveRequest {
    archived: bool,
}

impl From<QueryResponse> for RecordPage {
    fn from(resp: QueryResponse) -> Self {
        Self {
            ids:         resp.results.into_iter().map(|p| RecordId::new(p.id)).collect(),
            has_more:    resp.has_more,
            next_cursor: resp.next_cursor.filter(|c| !c.is_empty()),
        }
    }
}

// --- 実装 ---

/// 1 回の実行で使う Notion Record Source
pub struct NotionRecordSource {
    client:         reqwest::Client,
    base_url:       String,
    notion_version: String,
    token:          ApiToken,
    database_id:    DatabaseId,
}

impl NotionRecordSource {
    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(self.token.as_str())
            .header("Notion-Version", &self.notion_version)
    }
}

#[async_trait]
impl RecordSource for NotionRecordSource {
    async fn list(&self, cursor: Option<&str>) -> Result<RecordPage, RecordSourceError> {
        let url = format!(
            "{}/v1/databases/{}/query",
            self.base_url,
            self.database_id.as_str()
        );
        let request = QueryRequest {
            page_size:    PAGE_SIZE,
            start_cursor: cursor,
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response, "query").await?;
        let body = response.json::<QueryResponse>().await?;

        Ok(body.into())
    }

    async fn remove(&self, id: &RecordId) -> Result<(), RecordSourceError> {
        let url = format!("{}/v1/pages/{}", self.base_url, id.as_str());

        let response = self
            .authorized(self.client.patch(&url))
            .json(&ArchiveRequest { archived: true })
            .send()
            .await?;
        ensure_success(response, "archive").await?;

        tracing::debug!(record_id = %id, "ページをアーカイブしました");
        Ok(())
    }
}

/// [`NotionRecordSource`] のファクトリ
///
/// `reqwest::Client` は内部でコネクションプールを共有するため、
/// プロセスで 1 つだけ生成して各実行に clone して渡す。
#[derive(Clone)]
pub struct NotionRecordSourceFactory {
    client:   reqwest::Client,
    settings: NotionSettings,
}

impl NotionRecordSourceFactory {
    pub fn new(settings: NotionSettings) -> Result<Self, RecordSourceError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            settings: NotionSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
        })
    }
}

impl RecordSourceFactory for NotionRecordSourceFactory {
    fn create(&self, token: ApiToken, database_id: DatabaseId) -> Arc<dyn RecordSource> {
        Arc::new(NotionRecordSource {
            client: self.client.clone(),
            base_url: self.settings.base_url.clone(),
            notion_version: self.settings.notion_version.clone(),
            token,
            database_id,
        })
    }
}
