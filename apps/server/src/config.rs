//! # サーバー設定
//!
//! 環境変数からサーバーと Notion API の設定を読み込む。

use std::{env, time::Duration};

use sweeper_infra::NotionSettings;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_NOTION_TIMEOUT_SECS: u64 = 30;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// サーバーの設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// バインドアドレス
    pub host:   String,
    /// ポート番号
    pub port:   u16,
    /// Notion API の接続設定
    pub notion: NotionSettings,
}

impl ServerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストで環境変数を書き換えずに検証するために分けている。
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host:   string_or("SWEEPER_HOST", DEFAULT_HOST),
            port:   parse_or(&lookup, "SWEEPER_PORT", DEFAULT_PORT)?,
            notion: NotionSettings {
                base_url:       string_or("NOTION_API_URL", DEFAULT_NOTION_API_URL),
                notion_version: string_or("NOTION_VERSION", DEFAULT_NOTION_VERSION),
                timeout:        Duration::from_secs(parse_or(
                    &lookup,
                    "NOTION_TIMEOUT_SECS",
                    DEFAULT_NOTION_TIMEOUT_SECS,
                )?),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
