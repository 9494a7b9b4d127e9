//! Podcast Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StyleError {
    #[error("Unknown podcast style: {0}")]
    UnknownStyle(String),

    #[error("Unknown podcast tone: {0}")]
    UnknownTone(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineupError {
    #[error("At least 2 hosts are required, got {0}")]
    TooFewHosts(usize),

    #[error("Duplicate speaker role: {0}")]
    DuplicateRole(String),

    #[error("No voice mapped for speaker role: {0}")]
    MissingVoice(String),

    #[error("Invalid speaker role key: {0:?}")]
    InvalidRole(String),
}

/// 脚本校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script contains no turns")]
    EmptyScript,

    #[error("Script language is missing")]
    MissingLanguage,

    #[error("Turn {index} uses unknown speaker role {role:?}")]
    UnknownRole { index: usize, role: String },

    #[error("Turn {index} has an empty message")]
    EmptyUtterance { index: usize },
}

/// 音频拼接错误
#[derive(Debug, Error)]
pub enum AudioJoinError {
    #[error("No audio segments to join")]
    NoSegments,

    #[error("Segment {index} is out of order (expected index {expected})")]
    OutOfOrder { index: usize, expected: usize },

    #[error("Segment {index} is not valid WAV: {reason}")]
    InvalidWav { index: usize, reason: String },

    #[error("Segment {index} has format {found}, expected {expected}")]
    FormatMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Failed to write joined audio: {0}")]
    WriteError(String),
}
