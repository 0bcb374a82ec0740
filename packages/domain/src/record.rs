//! # レコード識別子
//!
//! リモートコレクション上の 1 レコード（Notion のページなど）を指す不透明な ID。
//! Collector が生成し、ワーカーがちょうど 1 回だけ消費する。

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// アーカイブ対象レコードの ID
///
/// 値の形式はリモート API に委ね、ここでは検証しない。
///
/// ```
/// use sweeper_domain::record::RecordId;
///
/// let id = RecordId::new("59833787-2cf9-4fdf-8782-e53db20768a5");
/// assert_eq!(id.as_str(), "59833787-2cf9-4fdf-8782-e53db20768a5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
