//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod http;

pub use adapters::{
    build_credential, build_document_extractor, build_script_generator, build_speech_synthesizer,
};
pub use events::EventPublisher;
