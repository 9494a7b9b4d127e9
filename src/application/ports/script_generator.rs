//! Script Generator Port - 播客脚本生成抽象

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::podcast::{HostLineup, Script, ScriptError, StyleConfig};

/// 生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 输出不符合脚本结构（缺字段、未知角色、空台词、空脚本）
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by generation service")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ScriptError> for GenerationError {
    fn from(err: ScriptError) -> Self {
        Self::SchemaViolation(err.to_string())
    }
}

/// 生成请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// 已按 token 上限截断的文本
    pub text: String,
    pub style: StyleConfig,
    pub title: String,
    /// 目标时长（分钟）
    pub target_minutes: u32,
    pub lineup: HostLineup,
}

/// token 用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct GeneratedScript {
    pub script: Script,
    pub usage: GenerationUsage,
}

/// Script Generator Port
#[async_trait]
pub trait ScriptGeneratorPort: Send + Sync {
    /// 生成并校验脚本，不做任何纠正
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedScript, GenerationError>;
}
