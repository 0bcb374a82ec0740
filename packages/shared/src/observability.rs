//! # Observability 基盤
//!
//! ログ出力の設定を環境変数から組み立て、`tracing` のサブスクライバを登録する。
//!
//! | 変数名 | 既定値 |
//! |--------|--------|
//! | `LOG_FORMAT` | `pretty`（`json` で 1 行 1 イベントの JSON） |
//! | `RUST_LOG` | [`DEFAULT_FILTER`] |
//!
//! 読み取りはトレーシング登録前に行うため、不正値の警告は stderr に出す。

use std::str::FromStr;

/// `RUST_LOG` 未設定時のフィルタ
pub const DEFAULT_FILTER: &str = "info,sweeper=debug";

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 集約基盤に流す JSON
    Json,
    /// 端末向け
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(other.to_string()),
        }
    }
}

/// ログ出力の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub log_format: LogFormat,
    /// `EnvFilter` の指定文字列
    pub filter:     String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            filter:     DEFAULT_FILTER.to_string(),
        }
    }
}

impl TracingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 変数の取得元を差し替えて読む
    ///
    /// 不明な `LOG_FORMAT` は警告して `pretty` にする。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_format = match lookup("LOG_FORMAT").map(|value| value.parse::<LogFormat>()) {
            None => LogFormat::default(),
            Some(Ok(format)) => format,
            Some(Err(unknown)) => {
                eprintln!("WARNING: unknown LOG_FORMAT={unknown:?}, using pretty");
                LogFormat::Pretty
            }
        };
        let filter = lookup("RUST_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self { log_format, filter }
    }
}

/// グローバルサブスクライバを登録する
///
/// JSON ではイベントのフィールドをトップレベルに展開し、現在のスパン
/// （`main` が張る `app` スパンの `service` など）を付ける。
/// フィルタ指定が解釈できない場合は [`DEFAULT_FILTER`] で起動する。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &TracingConfig) {
    use tracing_subscriber::{EnvFilter, Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|err| {
        eprintln!("WARNING: invalid RUST_LOG={:?} ({err}), using {DEFAULT_FILTER}", config.filter);
        EnvFilter::new(DEFAULT_FILTER)
    });

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
