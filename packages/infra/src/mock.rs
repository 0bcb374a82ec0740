//! # テスト用インメモリ Record Source
//!
//! ユースケーステストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! sweeper-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sweeper_domain::{
    credentials::{ApiToken, DatabaseId},
    record::RecordId,
};
use tokio::time::Instant;

use crate::{
    error::RecordSourceError,
    record_source::{RecordPage, RecordSource, RecordSourceFactory},
};

/// `remove` の呼び出し記録
#[derive(Debug, Clone)]
pub struct RemoveCall {
    pub id: RecordId,
    /// 呼び出し時刻（`tokio::time::pause` 下では仮想時刻）
    pub at: Instant,
}

#[derive(Debug, Default)]
struct State {
    list_calls:   Vec<Option<String>>,
    remove_calls: Vec<RemoveCall>,
}

/// インメモリ Record Source
///
/// `ids` を `page_size` 件ずつ返す。カーソルは次ページ先頭のオフセット。
/// 失敗させる一覧ページや `remove` の呼び出し番号を指定できる。
#[derive(Clone)]
pub struct InMemoryRecordSource {
    ids:               Arc<Vec<RecordId>>,
    page_size:         usize,
    fail_list_page:    Option<usize>,
    fail_remove_calls: Arc<Vec<usize>>,
    remove_latency:    Duration,
    state:             Arc<Mutex<State>>,
}

impl InMemoryRecordSource {
    pub fn new(ids: Vec<RecordId>) -> Self {
        Self {
            ids:               Arc::new(ids),
            page_size:         100,
            fail_list_page:    None,
            fail_remove_calls: Arc::new(Vec::new()),
            remove_latency:    Duration::ZERO,
            state:             Arc::new(Mutex::new(State::default())),
        }
    }

    /// `record-0` ～ `record-{count-1}` を持つソースを作成する
    pub fn with_count(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| RecordId::new(format!("record-{i}")))
                .collect(),
        )
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// `page`（0 始まり）番目の一覧取得を失敗させる
    pub fn fail_list_at(mut self, page: usize) -> Self {
        self.fail_list_page = Some(page);
        self
    }

    /// `call`（1 始まり）番目の `remove` 呼び出しを失敗させる
    pub fn fail_remove_at(mut self, call: usize) -> Self {
        Arc::make_mut(&mut self.fail_remove_calls).push(call);
        self
    }

    /// `remove` 1 回あたりの処理時間
    pub fn remove_latency(mut self, latency: Duration) -> Self {
        self.remove_latency = latency;
        self
    }

    /// 一覧取得で渡されたカーソルの履歴
    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn remove_calls(&self) -> Vec<RemoveCall> {
        self.state.lock().unwrap().remove_calls.clone()
    }

    /// `remove` で渡された ID（呼び出し順）
    pub fn removed_ids(&self) -> Vec<RecordId> {
        self.remove_calls().into_iter().map(|c| c.id).collect()
    }

    fn remote_error(operation: &'static str) -> RecordSourceError {
        RecordSourceError::Remote {
            operation,
            status: 500,
            body: "injected failure".to_string(),
        }
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn list(&self, cursor: Option<&str>) -> Result<RecordPage, RecordSourceError> {
        let page_index = {
            let mut state = self.state.lock().unwrap();
            state.list_calls.push(cursor.map(str::to_string));
            state.list_calls.len() - 1
        };
        if self.fail_list_page == Some(page_index) {
            return Err(Self::remote_error("query"));
        }

        let start = cursor
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0)
            .min(self.ids.len());
        let end = (start + self.page_size).min(self.ids.len());
        let has_more = end < self.ids.len();

        Ok(RecordPage {
            ids: self.ids[start..end].to_vec(),
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn remove(&self, id: &RecordId) -> Result<(), RecordSourceError> {
        let call_number = {
            let mut state = self.state.lock().unwrap();
            state.remove_calls.push(RemoveCall {
                id: id.clone(),
                at: Instant::now(),
            });
            state.remove_calls.len()
        };

        if !self.remove_latency.is_zero() {
            tokio::time::sleep(self.remove_latency).await;
        }
        if self.fail_remove_calls.contains(&call_number) {
            return Err(Self::remote_error("archive"));
        }
        Ok(())
    }
}

/// [`InMemoryRecordSource`] を返すファクトリ
///
/// 受け取った認証情報を記録する。
#[derive(Clone)]
pub struct InMemoryRecordSourceFactory {
    source:      InMemoryRecordSource,
    credentials: Arc<Mutex<Vec<(String, String)>>>,
}

impl InMemoryRecordSourceFactory {
    pub fn new(source: InMemoryRecordSource) -> Self {
        Self {
            source,
            credentials: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `create` に渡された `(token, database_id)` の履歴
    pub fn credentials(&self) -> Vec<(String, String)> {
        self.credentials.lock().unwrap().clone()
    }
}

impl RecordSourceFactory for InMemoryRecordSourceFactory {
    fn create(&self, token: ApiToken, database_id: DatabaseId) -> Arc<dyn RecordSource> {
        self.credentials
            .lock()
            .unwrap()
            .push((token.as_str().to_string(), database_id.as_str().to_string()));
        Arc::new(self.source.clone())
    }
}
