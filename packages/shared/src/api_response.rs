//! # API レスポンスエンベロープ
//!
//! 成功レスポンスの統一形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 成功レスポンスの統一型
///
/// 削除 API・ステータス API はいずれも `{ "data": T }` 形式で返す。
///
/// ## 使用例
///
/// ```
/// use sweeper_shared::ApiResponse;
///
/// let response = ApiResponse::new(42);
/// assert_eq!(response.data, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
