//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod document_extractor;
mod progress;
mod script_generator;
mod speech_synthesizer;

pub use document_extractor::{DocumentExtractorPort, ExtractionError};
pub use progress::{NoopProgress, ProgressEvent, ProgressReporterPort};
pub use script_generator::{
    GeneratedScript, GenerationError, GenerationRequest, GenerationUsage, ScriptGeneratorPort,
};
pub use speech_synthesizer::{
    SpeechSynthesizerPort, SynthesisError, SynthesisRequest, SynthesizedAudio,
};
