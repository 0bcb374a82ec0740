//! # Progress Hub
//!
//! 進捗スナップショットを任意数の購読者へ配信するプロセス全体で 1 つのハブ。
//!
//! ## 構成
//!
//! ```text
//! ┌──────────┐  publish   ┌─────────────────────┐  try_send  ┌────────────┐
//! │ Worker   │───────────▶│                     │───────────▶│ Subscriber │
//! ├──────────┤            │  Hub アクター        │            ├────────────┤
//! │ Handler  │──register─▶│  clients / last     │───────────▶│ Subscriber │
//! └──────────┘            └─────────────────────┘            └────────────┘
//! ```
//!
//! 状態（購読者一覧と最後のスナップショット）はアクタータスクだけが所有し、
//! すべての操作は 1 本のコマンドチャネルを FIFO で通る。
//! 登録された購読者には登録直後に `last` が届き、以後のスナップショットが順に届く。
//!
//! 購読者のバッファが満杯の場合、その購読者を除去してチャネルを閉じる。
//! 受信側はバッファ済みの分を読み切った後に `None` を受け取るので、
//! 再登録すれば `last` から追いつける。更新を黙って取りこぼすことはない。

use std::collections::HashMap;

use sweeper_domain::progress::ProgressSnapshot;
use thiserror::Error;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use uuid::Uuid;

/// コマンドチャネルの容量
const COMMAND_CAPACITY: usize = 256;

/// 購読者ごとのバッファ容量
const SUBSCRIBER_CAPACITY: usize = 64;

/// 購読者の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Progress Hub のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressHubError {
    /// アクタータスクが停止している
    #[error("Progress Hub は停止しています")]
    Closed,
}

enum HubCommand {
    Register {
        id: SubscriberId,
        tx: mpsc::Sender<ProgressSnapshot>,
    },
    Unregister {
        id: SubscriberId,
    },
    Publish(ProgressSnapshot),
    Last(oneshot::Sender<ProgressSnapshot>),
    SubscriberCount(oneshot::Sender<usize>),
}

/// 1 購読者分の受信口
///
/// drop しただけでは登録は残るが、次の配信で送信失敗として除去される。
/// 明示的に止める場合は [`ProgressHub::unregister`] を呼ぶ。
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<ProgressSnapshot>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// 次のスナップショットを待つ
    ///
    /// 登録解除、バッファあふれによる除去、ハブ停止で `None` を返す。
    pub async fn recv(&mut self) -> Option<ProgressSnapshot> {
        self.rx.recv().await
    }
}

/// Progress Hub へのハンドル
///
/// `Clone` で共有する。全ハンドルが drop されるとアクタータスクは終了する。
#[derive(Debug, Clone)]
pub struct ProgressHub {
    commands: mpsc::Sender<HubCommand>,
}

impl ProgressHub {
    /// アクタータスクを起動してハンドルを返す
    ///
    /// Tokio ランタイム上で呼ぶこと。
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(run_actor(rx));
        Self { commands }
    }

    /// 購読者を登録する
    ///
    /// 返した [`Subscription`] には最初に `last` が届く。
    pub async fn register(&self) -> Result<Subscription, ProgressHubError> {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);

        self.send(HubCommand::Register { id, tx }).await?;
        tracing::debug!(subscriber_id = %id, "購読者を登録しました");

        Ok(Subscription { id, rx })
    }

    /// 購読者を登録解除する
    ///
    /// 未登録・解除済みの ID に対しては何もしない。
    pub async fn unregister(&self, id: SubscriberId) {
        if self.send(HubCommand::Unregister { id }).await.is_err() {
            tracing::debug!(subscriber_id = %id, "Progress Hub 停止後の登録解除を無視しました");
        }
    }

    /// スナップショットを配信する
    ///
    /// コマンドチャネルに空きができるまで待つため、呼び出しが戻った時点で
    /// アクターへの引き渡しは保証される。
    pub async fn publish(&self, snapshot: ProgressSnapshot) {
        if self.send(HubCommand::Publish(snapshot)).await.is_err() {
            tracing::warn!(?snapshot, "Progress Hub が停止しているため配信できませんでした");
        }
    }

    /// 最後に配信されたスナップショットを取得する
    ///
    /// 一度も配信されていなければ [`ProgressSnapshot::default`] を返す。
    pub async fn last(&self) -> Result<ProgressSnapshot, ProgressHubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Last(reply)).await?;
        rx.await.map_err(|_| ProgressHubError::Closed)
    }

    /// 登録中の購読者数
    pub async fn subscriber_count(&self) -> Result<usize, ProgressHubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::SubscriberCount(reply)).await?;
        rx.await.map_err(|_| ProgressHubError::Closed)
    }

    async fn send(&self, command: HubCommand) -> Result<(), ProgressHubError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ProgressHubError::Closed)
    }
}

async fn run_actor(mut commands: mpsc::Receiver<HubCommand>) {
    let mut clients: HashMap<SubscriberId, mpsc::Sender<ProgressSnapshot>> = HashMap::new();
    let mut last = ProgressSnapshot::default();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register { id, tx } => {
                // 新しいバッファは空なので last は必ず入る
                if tx.try_send(last).is_ok() {
                    clients.insert(id, tx);
                }
            }
            HubCommand::Unregister { id } => {
                if clients.remove(&id).is_some() {
                    tracing::debug!(subscriber_id = %id, "購読者を登録解除しました");
                }
            }
            HubCommand::Publish(snapshot) => {
                last = snapshot;
                clients.retain(|id, tx| match tx.try_send(snapshot) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(subscriber_id = %id, "購読者のバッファが満杯のため切断しました");
                        false
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(subscriber_id = %id, "切断された購読者を除去しました");
                        false
                    }
                });
            }
            HubCommand::Last(reply) => {
                let _ = reply.send(last);
            }
            HubCommand::SubscriberCount(reply) => {
                let _ = reply.send(clients.len());
            }
        }
    }

    tracing::debug!("Progress Hub を停止しました");
}
