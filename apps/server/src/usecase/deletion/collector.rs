//! # Collector
//!
//! Record Source をカーソルで辿り、全レコード ID を列挙する。
//! 列挙が終わるまでアーカイブは始めない（total を確定させるため）。

use sweeper_domain::record::RecordId;
use sweeper_infra::{RecordSource, RecordSourceError};
use thiserror::Error;

/// 列挙の途中で失敗した
///
/// 失敗までに取得できた ID を保持する。実行はこの時点で中止する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("レコードの列挙に失敗しました（取得済み {} 件）: {source}", .collected.len())]
pub struct CollectError {
    pub collected: Vec<RecordId>,
    pub source:    RecordSourceError,
}

/// 全ページを取得し、ID をリモートの並び順で返す
///
/// `has_more` が false になるか、空のページを受け取ったら終了する。
pub async fn collect_all(source: &dyn RecordSource) -> Result<Vec<RecordId>, CollectError> {
    let mut collected = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match source.list(cursor.as_deref()).await {
            Ok(page) => page,
            Err(source) => return Err(CollectError { collected, source }),
        };

        let page_len = page.ids.len();
        collected.extend(page.ids);
        tracing::debug!(page_len, collected = collected.len(), "ページを取得しました");

        if !page.has_more || page_len == 0 {
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                tracing::warn!(
                    collected = collected.len(),
                    "has_more なのに next_cursor がないため列挙を打ち切ります"
                );
                break;
            }
        }
    }

    Ok(collected)
}
