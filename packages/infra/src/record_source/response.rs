//! Record Source レスポンスの共通ハンドリング

use crate::error::RecordSourceError;

/// 2xx 以外のレスポンスを [`RecordSourceError::Remote`] に変換する
///
/// 失敗時は診断用にレスポンス本文を読み取って保持する。
/// 本文の読み取り自体に失敗した場合は空文字とする。
pub(super) async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, RecordSourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RecordSourceError::Remote {
        operation,
        status: status.as_u16(),
        body,
    })
}
