//! Ping Handler
//!
//! 健康检查，附带语音合成服务可达性

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub speech_available: bool,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PingResponse>> {
    let speech_available = state.synthesizer.health_check().await;
    if !speech_available {
        tracing::warn!("Speech synthesizer health check failed");
    }

    Json(ApiResponse::success(PingResponse {
        status: if speech_available { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        speech_available,
    }))
}
