//! Speech Adapter - 语音合成实现

mod azure_speech;
mod fake_speech_synthesizer;

pub use azure_speech::{AzureSpeechClient, AzureSpeechConfig};
pub use fake_speech_synthesizer::{FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig};
