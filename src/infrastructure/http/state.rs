//! Application State
//!
//! 包含所有 Command Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    GeneratePodcastHandler, GenerateScriptHandler, PipelineSettings, ScriptNarrator,
    SynthesizeScriptHandler,
    // Ports
    DocumentExtractorPort, ProgressReporterPort, ScriptGeneratorPort, SpeechSynthesizerPort,
};
use crate::domain::podcast::HostLineup;
use crate::domain::TokenCounter;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub synthesizer: Arc<dyn SpeechSynthesizerPort>,
    pub event_publisher: Arc<EventPublisher>,

    /// 合成与脚本校验使用的主持人阵容
    pub lineup: HostLineup,

    // ========== Command Handlers ==========
    pub generate_script_handler: GenerateScriptHandler,
    pub synthesize_script_handler: SynthesizeScriptHandler,
    pub generate_podcast_handler: GeneratePodcastHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        extractor: Arc<dyn DocumentExtractorPort>,
        generator: Arc<dyn ScriptGeneratorPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        token_counter: Arc<dyn TokenCounter>,
        event_publisher: Arc<EventPublisher>,
        settings: PipelineSettings,
        max_concurrent: usize,
    ) -> Self {
        let progress: Arc<dyn ProgressReporterPort> = event_publisher.clone();
        let narrator = ScriptNarrator::new(synthesizer.clone(), max_concurrent);

        let script_handler = || {
            GenerateScriptHandler::new(
                extractor.clone(),
                generator.clone(),
                token_counter.clone(),
                progress.clone(),
                settings.clone(),
            )
        };
        let synthesize_handler = || {
            SynthesizeScriptHandler::new(narrator.clone(), progress.clone(), settings.clone())
        };

        Self {
            // Ports
            synthesizer: synthesizer.clone(),
            event_publisher: event_publisher.clone(),
            lineup: settings.lineup.clone(),

            // Command handlers
            generate_script_handler: script_handler(),
            synthesize_script_handler: synthesize_handler(),
            generate_podcast_handler: GeneratePodcastHandler::new(
                script_handler(),
                synthesize_handler(),
                progress.clone(),
            ),
        }
    }
}
