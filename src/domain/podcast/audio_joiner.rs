//! 音频拼接
//!
//! WAV 片段解析后合并为一个 RIFF 文件（各片段采样格式必须一致），
//! 其它编码（MP3 帧流）直接按字节首尾相接。

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

use super::errors::AudioJoinError;

/// 合并后的 WAV
#[derive(Debug, Clone)]
pub struct JoinedWav {
    pub data: Vec<u8>,
    pub duration_ms: u64,
}

fn describe(spec: &WavSpec) -> String {
    let kind = match spec.sample_format {
        SampleFormat::Int => "int",
        SampleFormat::Float => "float",
    };
    format!(
        "{}Hz/{}ch/{}bit-{}",
        spec.sample_rate, spec.channels, spec.bits_per_sample, kind
    )
}

/// 读取 WAV 时长（毫秒），无法解析时返回 None
pub fn wav_duration_ms(data: &[u8]) -> Option<u64> {
    let reader = WavReader::new(Cursor::new(data)).ok()?;
    let sample_rate = u64::from(reader.spec().sample_rate);
    if sample_rate == 0 {
        return None;
    }
    Some(u64::from(reader.duration()) * 1000 / sample_rate)
}

/// 按顺序合并 WAV 片段
pub fn join_wav(parts: &[&[u8]]) -> Result<JoinedWav, AudioJoinError> {
    if parts.is_empty() {
        return Err(AudioJoinError::NoSegments);
    }

    let first_spec = WavReader::new(Cursor::new(parts[0]))
        .map_err(|e| AudioJoinError::InvalidWav {
            index: 0,
            reason: e.to_string(),
        })?
        .spec();
    let sample_rate = first_spec.sample_rate;

    let mut buffer = Cursor::new(Vec::new());
    let mut frames: u64 = 0;

    {
        let mut writer = WavWriter::new(&mut buffer, first_spec)
            .map_err(|e| AudioJoinError::WriteError(e.to_string()))?;

        for (index, part) in parts.iter().enumerate() {
            let invalid = |e: hound::Error| AudioJoinError::InvalidWav {
                index,
                reason: e.to_string(),
            };
            let mut reader = WavReader::new(Cursor::new(*part)).map_err(invalid)?;
            let spec = reader.spec();
            if spec != first_spec {
                return Err(AudioJoinError::FormatMismatch {
                    index,
                    expected: describe(&first_spec),
                    found: describe(&spec),
                });
            }

            frames += u64::from(reader.duration());

            match spec.sample_format {
                SampleFormat::Int => {
                    for sample in reader.samples::<i32>() {
                        writer
                            .write_sample(sample.map_err(invalid)?)
                            .map_err(|e| AudioJoinError::WriteError(e.to_string()))?;
                    }
                }
                SampleFormat::Float => {
                    for sample in reader.samples::<f32>() {
                        writer
                            .write_sample(sample.map_err(invalid)?)
                            .map_err(|e| AudioJoinError::WriteError(e.to_string()))?;
                    }
                }
            }
        }

        writer
            .finalize()
            .map_err(|e| AudioJoinError::WriteError(e.to_string()))?;
    }

    let duration_ms = if sample_rate == 0 {
        0
    } else {
        frames * 1000 / u64::from(sample_rate)
    };

    Ok(JoinedWav {
        data: buffer.into_inner(),
        duration_ms,
    })
}

/// 字节级拼接
pub fn join_bytes(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut data = Vec::with_capacity(total);
    for part in parts {
        data.extend_from_slice(part);
    }
    data
}
