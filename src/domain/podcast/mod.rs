//! Podcast Context - 播客限界上下文
//!
//! 职责:
//! - 文档、抽取文本、脚本、音频等请求级实体
//! - 风格/语气、主持人阵容等值对象
//! - 片段拼接与成本估算

mod audio_joiner;
mod cost;
mod entities;
mod errors;
mod value_objects;

pub use audio_joiner::{join_bytes, join_wav, wav_duration_ms, JoinedWav};
pub use cost::{document_cost, generation_cost, speech_cost, CostBreakdown};
pub use entities::{
    AudioEncoding, AudioSegment, Document, ExtractedText, PodcastAudio, Script, SpeakerTurn,
};
pub use errors::{AudioJoinError, LineupError, ScriptError, StyleError};
pub use value_objects::{
    Host, HostLineup, PodcastStyle, PodcastTone, SpeakerRole, StyleConfig, MIN_HOSTS,
};

#[cfg(test)]
pub(crate) use audio_joiner::tests::constant_wav;
