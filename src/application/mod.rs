//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（文档抽取、脚本生成、语音合成、进度上报）
//! - commands: 播客流水线命令及处理器
//! - error: 按阶段归类的流水线错误

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{
        GeneratePodcastHandler, GenerateScriptHandler, PipelineSettings, ScriptNarrator,
        SynthesizeScriptHandler,
    },
    GeneratePodcastCommand, GeneratePodcastResponse, GenerateScriptCommand,
    GenerateScriptResponse, SynthesizeScriptCommand, SynthesizeScriptResponse,
};

pub use error::{ConfigurationError, PipelineError, PipelineStage};

pub use ports::{
    DocumentExtractorPort, ExtractionError, GeneratedScript, GenerationError, GenerationRequest,
    GenerationUsage, NoopProgress, ProgressEvent, ProgressReporterPort, ScriptGeneratorPort,
    SpeechSynthesizerPort, SynthesisError, SynthesisRequest, SynthesizedAudio,
};
