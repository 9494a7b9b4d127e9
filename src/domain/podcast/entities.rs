//! Podcast Context - Entities
//!
//! 单次请求内的不可变实体：Document -> ExtractedText -> Script -> PodcastAudio

use serde::Serialize;

use super::audio_joiner;
use super::errors::{AudioJoinError, ScriptError};
use super::value_objects::{HostLineup, SpeakerRole};

/// 上传的文档（原始字节 + 媒体类型）
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: String,
    file_name: Option<String>,
}

impl Document {
    /// 创建文档，媒体类型会去掉参数并转为小写（`Text/Plain; charset=utf-8` -> `text/plain`）
    pub fn new(bytes: Vec<u8>, media_type: impl AsRef<str>) -> Self {
        let media_type = media_type
            .as_ref()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        Self {
            bytes,
            media_type,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 抽取出的文本
///
/// 不变量: 内容去除空白后非空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    content: String,
    pages: u32,
}

impl ExtractedText {
    /// 内容为空或只有空白时返回 None
    pub fn new(content: impl Into<String>, pages: u32) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self { content, pages })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 页数（本地解码的纯文本为 0）
    pub fn pages(&self) -> u32 {
        self.pages
    }
}

/// 一轮对白
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakerTurn {
    speaker: SpeakerRole,
    message: String,
}

impl SpeakerTurn {
    pub fn new(speaker: SpeakerRole, message: impl Into<String>) -> Self {
        Self {
            speaker,
            message: message.into(),
        }
    }

    pub fn speaker(&self) -> &SpeakerRole {
        &self.speaker
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// 播客脚本：有序、非空的对白序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    language: String,
    turns: Vec<SpeakerTurn>,
}

impl Script {
    /// 按阵容校验后创建脚本
    ///
    /// 拒绝：空脚本、缺失语言、阵容外的角色、空白台词。不做任何纠正。
    pub fn new(
        language: impl Into<String>,
        turns: Vec<(String, String)>,
        lineup: &HostLineup,
    ) -> Result<Self, ScriptError> {
        let language = language.into();
        if language.trim().is_empty() {
            return Err(ScriptError::MissingLanguage);
        }
        if turns.is_empty() {
            return Err(ScriptError::EmptyScript);
        }

        let turns = turns
            .into_iter()
            .enumerate()
            .map(|(index, (speaker, message))| {
                let role = lineup
                    .find_role(&speaker)
                    .cloned()
                    .ok_or_else(|| ScriptError::UnknownRole {
                        index,
                        role: speaker.clone(),
                    })?;
                if message.trim().is_empty() {
                    return Err(ScriptError::EmptyUtterance { index });
                }
                Ok(SpeakerTurn::new(role, message))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            language: language.trim().to_string(),
            turns,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn turns(&self) -> &[SpeakerTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// 全部台词的字符数（用于语音合成计费）
    pub fn character_count(&self) -> usize {
        self.turns.iter().map(|t| t.message.chars().count()).sum()
    }
}

/// 音频编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// RIFF 容器内的 PCM
    Wav,
    Mp3,
}

impl AudioEncoding {
    /// 从 Azure Speech 输出格式名推断编码
    pub fn from_output_format(format: &str) -> Option<Self> {
        let format = format.to_lowercase();
        if format.starts_with("riff-") {
            Some(Self::Wav)
        } else if format.ends_with("-mp3") {
            Some(Self::Mp3)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

/// 单轮对白合成的音频片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub index: usize,
    pub speaker: SpeakerRole,
    pub audio_data: Vec<u8>,
    pub duration_ms: Option<u64>,
}

/// 最终的播客音频
#[derive(Debug, Clone)]
pub struct PodcastAudio {
    segments: Vec<AudioSegment>,
    data: Vec<u8>,
    encoding: AudioEncoding,
    duration_ms: Option<u64>,
}

impl PodcastAudio {
    /// 按脚本顺序拼接片段
    ///
    /// 片段必须已按 index 0..n 排列，否则返回 OutOfOrder。
    pub fn assemble(
        segments: Vec<AudioSegment>,
        encoding: AudioEncoding,
    ) -> Result<Self, AudioJoinError> {
        if segments.is_empty() {
            return Err(AudioJoinError::NoSegments);
        }
        for (expected, segment) in segments.iter().enumerate() {
            if segment.index != expected {
                return Err(AudioJoinError::OutOfOrder {
                    index: segment.index,
                    expected,
                });
            }
        }

        let parts: Vec<&[u8]> = segments.iter().map(|s| s.audio_data.as_slice()).collect();
        let (data, duration_ms) = match encoding {
            AudioEncoding::Wav => {
                let joined = audio_joiner::join_wav(&parts)?;
                (joined.data, Some(joined.duration_ms))
            }
            AudioEncoding::Mp3 => {
                let data = audio_joiner::join_bytes(&parts);
                let duration_ms = segments
                    .iter()
                    .map(|s| s.duration_ms)
                    .sum::<Option<u64>>();
                (data, duration_ms)
            }
        };

        Ok(Self {
            segments,
            data,
            encoding,
            duration_ms,
        })
    }

    pub fn segments(&self) -> &[AudioSegment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(s, m)| (s.to_string(), m.to_string()))
            .collect()
    }

    #[test]
    fn test_document_normalizes_media_type() {
        let doc = Document::new(b"hi".to_vec(), "Text/Plain; charset=utf-8");
        assert_eq!(doc.media_type(), "text/plain");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_extracted_text_rejects_blank() {
        assert!(ExtractedText::new("", 1).is_none());
        assert!(ExtractedText::new(" \n\t", 1).is_none());
        assert_eq!(ExtractedText::new("# Title", 2).unwrap().pages(), 2);
    }

    #[test]
    fn test_script_accepts_known_roles() {
        let lineup = HostLineup::default();
        let script = Script::new(
            "en-US",
            turns(&[("speaker_1", "Hey there!"), ("speaker_2", "Hi!")]),
            &lineup,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.turns()[1].speaker().as_str(), "speaker_2");
        assert_eq!(script.character_count(), 13);
    }

    #[test]
    fn test_script_rejects_unknown_role() {
        let lineup = HostLineup::default();
        let err = Script::new(
            "en-US",
            turns(&[("speaker_1", "Hey"), ("Andrew", "Hi")]),
            &lineup,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownRole {
                index: 1,
                role: "Andrew".to_string()
            }
        );
    }

    #[test]
    fn test_script_rejects_empty_message_and_empty_script() {
        let lineup = HostLineup::default();
        assert_eq!(
            Script::new("en-US", turns(&[("speaker_1", "  ")]), &lineup).unwrap_err(),
            ScriptError::EmptyUtterance { index: 0 }
        );
        assert_eq!(
            Script::new("en-US", vec![], &lineup).unwrap_err(),
            ScriptError::EmptyScript
        );
        assert_eq!(
            Script::new("", turns(&[("speaker_1", "Hi")]), &lineup).unwrap_err(),
            ScriptError::MissingLanguage
        );
    }

    #[test]
    fn test_audio_encoding_from_output_format() {
        assert_eq!(
            AudioEncoding::from_output_format("riff-48khz-16bit-mono-pcm"),
            Some(AudioEncoding::Wav)
        );
        assert_eq!(
            AudioEncoding::from_output_format("audio-24khz-48kbitrate-mono-mp3"),
            Some(AudioEncoding::Mp3)
        );
        assert_eq!(AudioEncoding::from_output_format("ogg-24khz-16bit-mono-opus"), None);
    }

    #[test]
    fn test_assemble_rejects_out_of_order_segments() {
        let role = SpeakerRole::new("speaker_1").unwrap();
        let segments = vec![
            AudioSegment {
                index: 1,
                speaker: role.clone(),
                audio_data: vec![1],
                duration_ms: Some(10),
            },
            AudioSegment {
                index: 0,
                speaker: role,
                audio_data: vec![0],
                duration_ms: Some(10),
            },
        ];
        assert!(matches!(
            PodcastAudio::assemble(segments, AudioEncoding::Mp3),
            Err(AudioJoinError::OutOfOrder { index: 1, expected: 0 })
        ));
    }

    #[test]
    fn test_assemble_mp3_concatenates_in_order() {
        let role = SpeakerRole::new("speaker_1").unwrap();
        let segments = (0..3)
            .map(|i| AudioSegment {
                index: i,
                speaker: role.clone(),
                audio_data: vec![i as u8; 2],
                duration_ms: Some(100),
            })
            .collect();
        let audio = PodcastAudio::assemble(segments, AudioEncoding::Mp3).unwrap();
        assert_eq!(audio.data(), &[0, 0, 1, 1, 2, 2]);
        assert_eq!(audio.segment_count(), 3);
        assert_eq!(audio.duration_ms(), Some(300));
    }
}
