//! 应用层错误定义
//!
//! 流水线错误按阶段归类，第一个失败的阶段决定返回的错误

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{ExtractionError, GenerationError, SynthesisError};
use crate::domain::podcast::LineupError;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Configuration,
    Extraction,
    Generation,
    Synthesis,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Extraction => "extraction",
            Self::Generation => "generation",
            Self::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 配置错误（在任何远程调用之前检出）
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid host lineup: {0}")]
    InvalidLineup(#[from] LineupError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

impl PipelineError {
    /// 失败所在阶段
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Configuration(_) => PipelineStage::Configuration,
            Self::Extraction(_) => PipelineStage::Extraction,
            Self::Generation(_) => PipelineStage::Generation,
            Self::Synthesis(_) => PipelineStage::Synthesis,
        }
    }

    /// 远程服务限流
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Extraction(ExtractionError::RateLimited) => true,
            Self::Generation(GenerationError::RateLimited) => true,
            Self::Synthesis(e) => e.is_rate_limited(),
            _ => false,
        }
    }

    /// 调用方输入本身有问题（格式不支持、文件过大）
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Extraction(ExtractionError::UnsupportedFormat(_))
                | Self::Extraction(ExtractionError::TooLarge(_))
        )
    }
}
