//! Speech Synthesizer Port - 语音合成抽象
//!
//! 一次调用合成一轮对白；整段脚本的并发合成与拼接由 ScriptNarrator 负责

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::podcast::{AudioEncoding, AudioJoinError};

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("No voice mapped for speaker role: {0}")]
    VoiceNotMapped(String),

    /// 服务拒绝请求（不支持的音色、文本过长等）
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by speech service")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Audio format mismatch: {0}")]
    FormatMismatch(String),

    #[error("Turn {index} failed: {source}")]
    TurnFailed {
        index: usize,
        #[source]
        source: Box<SynthesisError>,
    },

    #[error("Synthesis task aborted: {0}")]
    TaskAborted(String),
}

impl SynthesisError {
    /// 失败的对白序号
    pub fn turn_index(&self) -> Option<usize> {
        match self {
            Self::TurnFailed { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited => true,
            Self::TurnFailed { source, .. } => source.is_rate_limited(),
            _ => false,
        }
    }
}

impl From<AudioJoinError> for SynthesisError {
    fn from(err: AudioJoinError) -> Self {
        match err {
            AudioJoinError::FormatMismatch { .. } | AudioJoinError::InvalidWav { .. } => {
                Self::FormatMismatch(err.to_string())
            }
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

/// 单轮合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    /// 服务端音色名
    pub voice: String,
    /// BCP-47 语言标签
    pub language: String,
}

/// 单轮合成结果
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio_data: Vec<u8>,
    pub duration_ms: Option<u64>,
}

/// Speech Synthesizer Port
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 合成一轮对白
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, SynthesisError>;

    /// 输出音频编码（决定拼接方式）
    fn encoding(&self) -> AudioEncoding;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
