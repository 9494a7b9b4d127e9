//! Progress Reporter Port - 流水线进度上报

use serde::Serialize;

use crate::application::error::PipelineStage;

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    StageStarted {
        stage: PipelineStage,
    },
    StageCompleted {
        stage: PipelineStage,
        elapsed_ms: u64,
    },
    StageFailed {
        stage: PipelineStage,
        error: String,
    },
    /// 单轮对白合成完成（completed 为已完成数量，不代表顺序）
    TurnSynthesized {
        index: usize,
        completed: usize,
        total: usize,
    },
    PodcastReady {
        segments: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        cost_usd: f64,
    },
}

/// Progress Reporter Port
pub trait ProgressReporterPort: Send + Sync {
    fn publish(&self, request_id: &str, event: ProgressEvent);
}

/// 丢弃所有事件
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporterPort for NoopProgress {
    fn publish(&self, _request_id: &str, _event: ProgressEvent) {}
}
