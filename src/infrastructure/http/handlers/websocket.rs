//! WebSocket Handler - 流水线进度推送
//!
//! `/ws/events` 推送所有请求的进度；`/ws/events?request_id=xxx` 只推送该请求。
//! 客户端可以先用自己生成的 request_id 订阅，再发起上传。

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub request_id: Option<String>,
}

/// 进度 WebSocket 连接处理
pub async fn events_websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<EventsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let request_id = query.request_id.filter(|id| !id.trim().is_empty());
    ws.on_upgrade(move |socket| handle_events_socket(socket, request_id, state))
}

async fn handle_events_socket(socket: WebSocket, request_id: Option<String>, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let event_rx = match &request_id {
        Some(id) => state.event_publisher.register_request(id),
        None => state.event_publisher.subscribe_global(),
    };

    tracing::info!(request_id = ?request_id, "Events WebSocket connected");

    // 事件转发
    let forward = async move {
        let mut event_rx: broadcast::Receiver<WsEvent> = event_rx;
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Events WebSocket lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    };

    // 接收客户端消息（心跳 / 关闭）
    let receive = async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!("Events WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Events WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    };

    // 等待任一方向结束，另一方随之丢弃
    tokio::select! {
        _ = forward => {}
        _ = receive => {}
    }

    if let Some(id) = &request_id {
        state.event_publisher.release_request(id);
    }
    tracing::info!(request_id = ?request_id, "Events WebSocket disconnected");
}
