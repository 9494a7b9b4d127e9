//! Script Narrator - 按脚本逐轮合成并拼接
//!
//! 各轮对白并发合成（受信号量限制），每个任务携带自己的序号，
//! 结果按序号回填，与完成顺序无关。任意一轮失败则整体失败，
//! 剩余任务随 JoinSet 一起被中止。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::application::ports::{
    ProgressEvent, ProgressReporterPort, SpeechSynthesizerPort, SynthesisError, SynthesisRequest,
};
use crate::domain::podcast::{AudioSegment, HostLineup, PodcastAudio, Script};

#[derive(Clone)]
pub struct ScriptNarrator {
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    max_concurrent: usize,
}

impl ScriptNarrator {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizerPort>, max_concurrent: usize) -> Self {
        Self {
            synthesizer,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// 合成整段脚本
    ///
    /// 音色在发起任何远程调用前全部解析；缺失映射直接返回 VoiceNotMapped
    pub async fn narrate(
        &self,
        request_id: &str,
        script: &Script,
        lineup: &HostLineup,
        progress: &dyn ProgressReporterPort,
    ) -> Result<PodcastAudio, SynthesisError> {
        let jobs = script
            .turns()
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                let voice = lineup
                    .voice_for(turn.speaker())
                    .ok_or_else(|| SynthesisError::VoiceNotMapped(turn.speaker().to_string()))?;
                Ok((
                    index,
                    turn.speaker().clone(),
                    SynthesisRequest {
                        text: turn.message().to_string(),
                        voice: voice.to_string(),
                        language: script.language().to_string(),
                    },
                ))
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;

        let total = jobs.len();
        tracing::info!(
            request_id = %request_id,
            turns = total,
            max_concurrent = self.max_concurrent,
            "Synthesizing script"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, speaker, request) in jobs {
            let synthesizer = Arc::clone(&self.synthesizer);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SynthesisError::TaskAborted(e.to_string()))?;

                synthesizer
                    .synthesize(request)
                    .await
                    .map(|audio| AudioSegment {
                        index,
                        speaker,
                        audio_data: audio.audio_data,
                        duration_ms: audio.duration_ms,
                    })
                    .map_err(|e| SynthesisError::TurnFailed {
                        index,
                        source: Box::new(e),
                    })
            });
        }

        let mut slots: Vec<Option<AudioSegment>> = vec![None; total];
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            let segment = match joined {
                Ok(Ok(segment)) => segment,
                Ok(Err(e)) => {
                    tracing::warn!(
                        request_id = %request_id,
                        turn = ?e.turn_index(),
                        error = %e,
                        "Turn synthesis failed, aborting remaining turns"
                    );
                    return Err(e);
                }
                Err(e) => return Err(SynthesisError::TaskAborted(e.to_string())),
            };

            completed += 1;
            tracing::debug!(
                request_id = %request_id,
                turn = segment.index,
                bytes = segment.audio_data.len(),
                completed,
                total,
                "Turn synthesized"
            );
            progress.publish(
                request_id,
                ProgressEvent::TurnSynthesized {
                    index: segment.index,
                    completed,
                    total,
                },
            );

            let index = segment.index;
            slots[index] = Some(segment);
        }

        let segments = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| SynthesisError::TaskAborted(format!("turn {} missing", index)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let audio = PodcastAudio::assemble(segments, self.synthesizer.encoding())?;
        tracing::info!(
            request_id = %request_id,
            segments = audio.segment_count(),
            bytes = audio.data().len(),
            duration_ms = ?audio.duration_ms(),
            "Podcast audio assembled"
        );
        Ok(audio)
    }
}
