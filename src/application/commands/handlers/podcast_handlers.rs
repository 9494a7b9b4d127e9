//! Podcast Command Handlers
//!
//! 抽取 -> 生成 -> 合成严格串行，第一个失败的阶段短路返回

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::application::commands::podcast_commands::*;
use crate::application::error::{ConfigurationError, PipelineError, PipelineStage};
use crate::application::ports::{
    DocumentExtractorPort, GenerationRequest, ProgressEvent, ProgressReporterPort,
    ScriptGeneratorPort,
};
use crate::domain::podcast::{
    document_cost, generation_cost, speech_cost, CostBreakdown, HostLineup,
};
use crate::domain::{apply_token_budget, TokenCounter};

use super::ScriptNarrator;

/// 流水线设置
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub lineup: HostLineup,
    pub default_title: String,
    pub target_minutes: u32,
    pub max_input_tokens: usize,
}

impl PipelineSettings {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.lineup.validate()?;
        if self.max_input_tokens == 0 {
            return Err(ConfigurationError::Invalid(
                "max_input_tokens must be at least 1".to_string(),
            ));
        }
        if self.target_minutes == 0 {
            return Err(ConfigurationError::Invalid(
                "target_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// 执行一个阶段并上报进度
async fn run_stage<T, E, F>(
    progress: &dyn ProgressReporterPort,
    request_id: &str,
    stage: PipelineStage,
    future: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<PipelineError>,
{
    progress.publish(request_id, ProgressEvent::StageStarted { stage });
    let started = Instant::now();

    match future.await {
        Ok(value) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(
                request_id = %request_id,
                stage = %stage,
                elapsed_ms,
                "Pipeline stage completed"
            );
            progress.publish(request_id, ProgressEvent::StageCompleted { stage, elapsed_ms });
            Ok(value)
        }
        Err(e) => {
            let err = e.into();
            tracing::warn!(
                request_id = %request_id,
                stage = %stage,
                error = %err,
                "Pipeline stage failed"
            );
            progress.publish(
                request_id,
                ProgressEvent::StageFailed {
                    stage,
                    error: err.to_string(),
                },
            );
            Err(err)
        }
    }
}

/// 配置错误也作为一个阶段上报
fn check_settings(
    settings: &PipelineSettings,
    progress: &dyn ProgressReporterPort,
    request_id: &str,
) -> Result<(), PipelineError> {
    settings.validate().map_err(|e| {
        let err = PipelineError::from(e);
        tracing::error!(request_id = %request_id, error = %err, "Invalid pipeline configuration");
        progress.publish(
            request_id,
            ProgressEvent::StageFailed {
                stage: PipelineStage::Configuration,
                error: err.to_string(),
            },
        );
        err
    })
}

/// GenerateScript Handler - 抽取并生成脚本（供审阅）
pub struct GenerateScriptHandler {
    extractor: Arc<dyn DocumentExtractorPort>,
    generator: Arc<dyn ScriptGeneratorPort>,
    token_counter: Arc<dyn TokenCounter>,
    progress: Arc<dyn ProgressReporterPort>,
    settings: PipelineSettings,
}

impl GenerateScriptHandler {
    pub fn new(
        extractor: Arc<dyn DocumentExtractorPort>,
        generator: Arc<dyn ScriptGeneratorPort>,
        token_counter: Arc<dyn TokenCounter>,
        progress: Arc<dyn ProgressReporterPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            generator,
            token_counter,
            progress,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: GenerateScriptCommand,
    ) -> Result<GenerateScriptResponse, PipelineError> {
        let request_id = cmd.request_id;
        check_settings(&self.settings, self.progress.as_ref(), &request_id)?;

        tracing::info!(
            request_id = %request_id,
            media_type = %cmd.document.media_type(),
            bytes = cmd.document.len(),
            style = %cmd.style.style,
            tone = %cmd.style.tone,
            "Generating podcast script"
        );

        let extracted = run_stage(
            self.progress.as_ref(),
            &request_id,
            PipelineStage::Extraction,
            self.extractor.extract(cmd.document),
        )
        .await?;
        let pages = extracted.pages();

        let budgeted = apply_token_budget(
            self.token_counter.as_ref(),
            extracted.content(),
            self.settings.max_input_tokens,
        );
        if budgeted.truncated {
            tracing::warn!(
                request_id = %request_id,
                max_input_tokens = self.settings.max_input_tokens,
                original_tokens = self.token_counter.count(extracted.content()),
                "Extracted text exceeds token budget, truncating"
            );
        }
        let input_truncated = budgeted.truncated;

        let title = cmd
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_title.clone());
        let request = GenerationRequest {
            text: budgeted.text.to_string(),
            style: cmd.style,
            title,
            target_minutes: self.settings.target_minutes,
            lineup: self.settings.lineup.clone(),
        };

        let generated = run_stage(
            self.progress.as_ref(),
            &request_id,
            PipelineStage::Generation,
            self.generator.generate(request),
        )
        .await?;

        let cost = CostBreakdown {
            document_usd: document_cost(pages),
            generation_usd: generation_cost(
                generated.usage.prompt_tokens,
                generated.usage.completion_tokens,
            ),
            speech_usd: 0.0,
        };

        tracing::info!(
            request_id = %request_id,
            turns = generated.script.len(),
            language = %generated.script.language(),
            prompt_tokens = generated.usage.prompt_tokens,
            completion_tokens = generated.usage.completion_tokens,
            "Podcast script generated"
        );

        Ok(GenerateScriptResponse {
            request_id,
            script: generated.script,
            pages,
            usage: generated.usage,
            input_truncated,
            cost,
        })
    }
}

/// SynthesizeScript Handler - 合成已有脚本
pub struct SynthesizeScriptHandler {
    narrator: ScriptNarrator,
    progress: Arc<dyn ProgressReporterPort>,
    settings: PipelineSettings,
}

impl SynthesizeScriptHandler {
    pub fn new(
        narrator: ScriptNarrator,
        progress: Arc<dyn ProgressReporterPort>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            narrator,
            progress,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: SynthesizeScriptCommand,
    ) -> Result<SynthesizeScriptResponse, PipelineError> {
        let request_id = cmd.request_id;
        check_settings(&self.settings, self.progress.as_ref(), &request_id)?;

        let audio = run_stage(
            self.progress.as_ref(),
            &request_id,
            PipelineStage::Synthesis,
            self.narrator.narrate(
                &request_id,
                &cmd.script,
                &self.settings.lineup,
                self.progress.as_ref(),
            ),
        )
        .await?;

        let cost = CostBreakdown {
            speech_usd: speech_cost(cmd.script.character_count()),
            ..CostBreakdown::default()
        };

        Ok(SynthesizeScriptResponse {
            request_id,
            audio,
            cost,
        })
    }
}

/// GeneratePodcast Handler - 完整流水线
pub struct GeneratePodcastHandler {
    script_handler: GenerateScriptHandler,
    synthesize_handler: SynthesizeScriptHandler,
    progress: Arc<dyn ProgressReporterPort>,
}

impl GeneratePodcastHandler {
    pub fn new(
        script_handler: GenerateScriptHandler,
        synthesize_handler: SynthesizeScriptHandler,
        progress: Arc<dyn ProgressReporterPort>,
    ) -> Self {
        Self {
            script_handler,
            synthesize_handler,
            progress,
        }
    }

    pub async fn handle(
        &self,
        cmd: GeneratePodcastCommand,
    ) -> Result<GeneratePodcastResponse, PipelineError> {
        let started = Instant::now();
        let scripted = self.script_handler.handle(cmd.into()).await?;

        let synthesized = self
            .synthesize_handler
            .handle(SynthesizeScriptCommand {
                request_id: scripted.request_id.clone(),
                script: scripted.script.clone(),
            })
            .await?;

        let cost = CostBreakdown {
            speech_usd: synthesized.cost.speech_usd,
            ..scripted.cost
        };

        tracing::info!(
            request_id = %scripted.request_id,
            segments = synthesized.audio.segment_count(),
            duration_ms = ?synthesized.audio.duration_ms(),
            pages = scripted.pages,
            cost_usd = cost.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Podcast ready"
        );
        self.progress.publish(
            &scripted.request_id,
            ProgressEvent::PodcastReady {
                segments: synthesized.audio.segment_count(),
                duration_ms: synthesized.audio.duration_ms(),
                cost_usd: cost.total(),
            },
        );

        Ok(GeneratePodcastResponse {
            request_id: scripted.request_id,
            script: scripted.script,
            audio: synthesized.audio,
            pages: scripted.pages,
            usage: scripted.usage,
            input_truncated: scripted.input_truncated,
            cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        ExtractionError, GeneratedScript, GenerationError, GenerationUsage, NoopProgress,
        SpeechSynthesizerPort, SynthesisError, SynthesisRequest, SynthesizedAudio,
    };
    use crate::domain::podcast::{
        constant_wav, AudioEncoding, Document, ExtractedText, Host, PodcastStyle, PodcastTone,
        Script, SpeakerRole, StyleConfig,
    };
    use crate::domain::WhitespaceTokenCounter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct PlainExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentExtractorPort for PlainExtractor {
        async fn extract(&self, document: Document) -> Result<ExtractedText, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = String::from_utf8(document.into_bytes())
                .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
            ExtractedText::new(text, 1).ok_or(ExtractionError::EmptyDocument)
        }

        fn supports(&self, _media_type: &str) -> bool {
            true
        }
    }

    /// 生成 12 轮交替对白，并记录收到的请求
    #[derive(Default)]
    struct AlternatingGenerator {
        calls: AtomicUsize,
        last_request: Mutex<Option<GenerationRequest>>,
        bad_role: bool,
    }

    #[async_trait]
    impl ScriptGeneratorPort for AlternatingGenerator {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GeneratedScript, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let turns = (0..12)
                .map(|i| {
                    let role = match (self.bad_role, i % 2) {
                        (true, _) if i == 5 => "narrator",
                        (_, 0) => "speaker_1",
                        _ => "speaker_2",
                    };
                    (role.to_string(), "word ".repeat(i + 1).trim_end().to_string())
                })
                .collect();
            let script = Script::new("en-US", turns, &request.lineup)?;
            *self.last_request.lock().unwrap() = Some(request);
            Ok(GeneratedScript {
                script,
                usage: GenerationUsage {
                    prompt_tokens: 1_000,
                    completion_tokens: 500,
                },
            })
        }
    }

    /// 16kHz 单声道 WAV，每个字符 10ms
    #[derive(Default)]
    struct WavSynthesizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechSynthesizerPort for WavSynthesizer {
        async fn synthesize(
            &self,
            request: SynthesisRequest,
        ) -> Result<SynthesizedAudio, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let chars = request.text.chars().count();
            Ok(SynthesizedAudio {
                audio_data: constant_wav(16_000, chars * 160, 7),
                duration_ms: Some(chars as u64 * 10),
            })
        }

        fn encoding(&self) -> AudioEncoding {
            AudioEncoding::Wav
        }
    }

    struct Fixture {
        extractor: Arc<PlainExtractor>,
        generator: Arc<AlternatingGenerator>,
        synthesizer: Arc<WavSynthesizer>,
        handler: GeneratePodcastHandler,
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            lineup: HostLineup::default(),
            default_title: "AI Podcast".to_string(),
            target_minutes: 5,
            max_input_tokens: 100,
        }
    }

    fn fixture_with(settings: PipelineSettings, generator: AlternatingGenerator) -> Fixture {
        let extractor = Arc::new(PlainExtractor::default());
        let generator = Arc::new(generator);
        let synthesizer = Arc::new(WavSynthesizer::default());
        let progress: Arc<dyn ProgressReporterPort> = Arc::new(NoopProgress);

        let script_handler = GenerateScriptHandler::new(
            extractor.clone(),
            generator.clone(),
            Arc::new(WhitespaceTokenCounter),
            progress.clone(),
            settings.clone(),
        );
        let synthesize_handler = SynthesizeScriptHandler::new(
            ScriptNarrator::new(synthesizer.clone(), 4),
            progress.clone(),
            settings,
        );

        Fixture {
            extractor,
            generator,
            synthesizer,
            handler: GeneratePodcastHandler::new(script_handler, synthesize_handler, progress),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(settings(), AlternatingGenerator::default())
    }

    fn command(text: &str) -> GeneratePodcastCommand {
        GeneratePodcastCommand {
            request_id: "req-42".to_string(),
            document: Document::new(text.as_bytes().to_vec(), "text/plain"),
            style: StyleConfig::new(PodcastStyle::PlanetMoney, PodcastTone::Conversational),
            title: None,
        }
    }

    #[tokio::test]
    async fn test_planet_money_end_to_end() {
        let f = fixture();
        let response = f
            .handler
            .handle(command("# Inflation\n\nPrices rose across the board."))
            .await
            .unwrap();

        assert_eq!(response.script.len(), 12);
        assert_eq!(response.audio.segment_count(), 12);
        for (i, (turn, segment)) in response
            .script
            .turns()
            .iter()
            .zip(response.audio.segments())
            .enumerate()
        {
            let expected = if i % 2 == 0 { "speaker_1" } else { "speaker_2" };
            assert_eq!(turn.speaker().as_str(), expected);
            assert_eq!(segment.index, i);
            assert_eq!(segment.speaker, *turn.speaker());
        }

        // 时长与台词长度成正比
        let chars = response.script.character_count() as u64;
        assert_eq!(response.audio.duration_ms(), Some(chars * 10));
        assert_eq!(response.audio.encoding(), AudioEncoding::Wav);

        let request = f.generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.title, "AI Podcast");
        assert_eq!(request.style.style, PodcastStyle::PlanetMoney);
        assert!(!response.input_truncated);

        assert!(response.cost.document_usd > 0.0);
        assert!(response.cost.generation_usd > 0.0);
        assert!(response.cost.speech_usd > 0.0);
    }

    #[tokio::test]
    async fn test_pipeline_is_idempotent_with_deterministic_adapters() {
        let f = fixture();
        let first = f.handler.handle(command("Same input text.")).await.unwrap();
        let second = f.handler.handle(command("Same input text.")).await.unwrap();

        assert_eq!(first.script, second.script);
        assert_eq!(first.audio.data(), second.audio.data());
    }

    #[tokio::test]
    async fn test_empty_document_short_circuits() {
        let f = fixture();
        let err = f.handler.handle(command("   \n ")).await.unwrap_err();

        assert_eq!(err.stage(), PipelineStage::Extraction);
        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractionError::EmptyDocument)
        ));
        assert_eq!(f.extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupted_document_short_circuits() {
        let f = fixture();
        let mut cmd = command("");
        cmd.document = Document::new(vec![0xff, 0xfe, 0x00, 0xc3], "text/plain");

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractionError::Unreadable(_))
        ));
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_schema_violation_stops_before_synthesis() {
        let generator = AlternatingGenerator {
            bad_role: true,
            ..Default::default()
        };
        let f = fixture_with(settings(), generator);

        let err = f.handler.handle(command("Some text.")).await.unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Generation);
        assert!(matches!(
            err,
            PipelineError::Generation(GenerationError::SchemaViolation(_))
        ));
        assert_eq!(f.synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_lineup_fails_before_any_call() {
        let mut bad = settings();
        bad.lineup = HostLineup::new(vec![Host::new(
            SpeakerRole::new("speaker_1").unwrap(),
            "Andrew",
            "en-US-Andrew:DragonHDLatestNeural",
        )]);
        let f = fixture_with(bad, AlternatingGenerator::default());

        let err = f.handler.handle(command("Some text.")).await.unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Configuration);
        assert_eq!(f.extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_input_is_truncated_to_token_budget() {
        let mut small = settings();
        small.max_input_tokens = 3;
        let f = fixture_with(small, AlternatingGenerator::default());

        let mut cmd = command("one two three four");
        cmd.title = Some("Counting".to_string());
        let response = f.handler.handle(cmd).await.unwrap();

        assert!(response.input_truncated);
        let request = f.generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.text, "one two three");
        assert_eq!(request.title, "Counting");
    }
}
