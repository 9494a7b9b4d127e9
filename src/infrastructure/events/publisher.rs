//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::application::ports::{ProgressEvent, ProgressReporterPort};

const CHANNEL_CAPACITY: usize = 100;

/// 带 request_id 的进度消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressMessage {
    pub request_id: String,
    #[serde(flatten)]
    pub progress: ProgressEvent,
}

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 流水线进度
    Progress(ProgressMessage),
}

impl WsEvent {
    pub fn request_id(&self) -> &str {
        match self {
            WsEvent::Progress(msg) => &msg.request_id,
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// request_id -> broadcast sender (for request-specific events)
    request_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// Global broadcast channel for every pipeline event
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            request_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册请求的事件通道
    ///
    /// 客户端可以在发起请求之前用自己的 request_id 订阅
    pub fn register_request(&self, request_id: &str) -> broadcast::Receiver<WsEvent> {
        self.request_channels
            .entry(request_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 释放请求通道（仍有订阅者时保留）
    pub fn release_request(&self, request_id: &str) {
        self.request_channels
            .remove_if(request_id, |_, sender| sender.receiver_count() == 0);
    }

    /// 获取请求的事件接收器
    pub fn subscribe(&self, request_id: &str) -> Option<broadcast::Receiver<WsEvent>> {
        self.request_channels.get(request_id).map(|s| s.subscribe())
    }

    fn publish_event(&self, event: WsEvent) {
        if let Some(sender) = self.request_channels.get(event.request_id()) {
            if let Err(e) = sender.send(event.clone()) {
                tracing::debug!(
                    request_id = %event.request_id(),
                    error = %e,
                    "Failed to publish request event (no receivers)"
                );
            }
        }

        if let Err(e) = self.global_channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish global event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporterPort for EventPublisher {
    fn publish(&self, request_id: &str, event: ProgressEvent) {
        self.publish_event(WsEvent::Progress(ProgressMessage {
            request_id: request_id.to_string(),
            progress: event,
        }));
    }
}
