//! # 進捗配信ハンドラ
//!
//! `GET /ws` で WebSocket に昇格し、スナップショットを JSON テキストで送り続ける。
//!
//! 接続直後に最新のスナップショットが 1 件届き、以後は配信のたびに届く。
//! 送信に失敗するかクライアントが切断したら購読を解除する。

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};

use super::SharedDeletionState;
use crate::progress_hub::ProgressHub;

/// GET /ws
pub async fn progress_ws(
    State(state): State<SharedDeletionState>,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| stream_progress(socket, hub))
}

async fn stream_progress(mut socket: WebSocket, hub: ProgressHub) {
    let mut subscription = match hub.register().await {
        Ok(subscription) => subscription,
        Err(err) => {
            tracing::warn!(error = %err, "進捗の購読を開始できませんでした");
            return;
        }
    };
    let subscriber_id = subscription.id();
    tracing::debug!(%subscriber_id, "WebSocket 接続を開始しました");

    loop {
        tokio::select! {
            snapshot = subscription.recv() => {
                let Some(snapshot) = snapshot else { break };
                let json = match serde_json::to_string(&snapshot) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::error!(error = %err, "スナップショットのシリアライズに失敗しました");
                        break;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                // クライアントからのメッセージは読み捨てる
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.unregister(subscriber_id).await;
    tracing::debug!(%subscriber_id, "WebSocket 接続を終了しました");
}
