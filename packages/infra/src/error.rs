//! # Record Source エラー定義
//!
//! どちらの種別も実行中の削除処理にとって致命的であり、リトライはしない。

use thiserror::Error;

/// Record Source との通信で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordSourceError {
    /// ネットワーク・IO エラー
    ///
    /// 接続失敗、タイムアウト、2xx だがボディを解釈できない場合を含む。
    #[error("通信エラー: {0}")]
    Transport(String),

    /// リモート API が 2xx 以外を返した
    #[error("{operation} が失敗しました（ステータス {status}）: {body}")]
    Remote {
        /// 失敗した操作（`"query"` / `"archive"`）
        operation: &'static str,
        status:    u16,
        /// 診断用のレスポンス本文
        body:      String,
    },
}

impl From<reqwest::Error> for RecordSourceError {
    fn from(err: reqwest::Error) -> Self {
        RecordSourceError::Transport(err.to_string())
    }
}
