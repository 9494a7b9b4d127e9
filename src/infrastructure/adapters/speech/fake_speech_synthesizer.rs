//! Fake Speech Synthesizer - 离线确定性语音合成
//!
//! 生成正弦波 WAV，时长与字符数成正比，频率由音色名决定。
//! 相同请求总是得到字节一致的音频。

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::io::Cursor;

use crate::application::ports::{
    SpeechSynthesizerPort, SynthesisError, SynthesisRequest, SynthesizedAudio,
};
use crate::domain::podcast::AudioEncoding;

/// Fake Speech Synthesizer 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechSynthesizerConfig {
    pub sample_rate: u32,
    /// 每个字符对应的毫秒数
    pub ms_per_char: u32,
}

impl Default for FakeSpeechSynthesizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            ms_per_char: 60,
        }
    }
}

pub struct FakeSpeechSynthesizer {
    config: FakeSpeechSynthesizerConfig,
}

impl FakeSpeechSynthesizer {
    pub fn new(config: FakeSpeechSynthesizerConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            ms_per_char = config.ms_per_char,
            "FakeSpeechSynthesizer initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechSynthesizerConfig::default())
    }

    /// 不同音色使用不同音高
    fn frequency(voice: &str) -> f32 {
        let hash = voice.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        180.0 + (hash % 200) as f32
    }

    fn render(&self, voice: &str, duration_ms: u64) -> Result<Vec<u8>, SynthesisError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let frames = duration_ms * u64::from(self.config.sample_rate) / 1000;
        let frequency = Self::frequency(voice);

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| SynthesisError::ServiceError(e.to_string()))?;
            for n in 0..frames {
                let t = n as f32 / self.config.sample_rate as f32;
                let sample = (2.0 * PI * frequency * t).sin() * 0.3 * i16::MAX as f32;
                writer
                    .write_sample(sample as i16)
                    .map_err(|e| SynthesisError::ServiceError(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| SynthesisError::ServiceError(e.to_string()))?;
        }
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl SpeechSynthesizerPort for FakeSpeechSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, SynthesisError> {
        if request.voice.trim().is_empty() {
            return Err(SynthesisError::Rejected("Empty voice name".to_string()));
        }

        let chars = request.text.chars().count() as u64;
        let duration_ms = chars * u64::from(self.config.ms_per_char);
        let audio_data = self.render(&request.voice, duration_ms)?;

        tracing::debug!(
            voice = %request.voice,
            chars,
            duration_ms,
            "FakeSpeechSynthesizer rendered tone"
        );

        Ok(SynthesizedAudio {
            audio_data,
            duration_ms: Some(duration_ms),
        })
    }

    fn encoding(&self) -> AudioEncoding {
        AudioEncoding::Wav
    }
}
