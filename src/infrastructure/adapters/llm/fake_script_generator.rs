//! Fake Script Generator - 离线确定性脚本生成
//!
//! 不调用任何服务：按阵容轮流发言，逐句复述输入文本。
//! 相同输入总是得到相同脚本。

use async_trait::async_trait;

use crate::application::ports::{
    GeneratedScript, GenerationError, GenerationRequest, GenerationUsage, ScriptGeneratorPort,
};
use crate::domain::podcast::Script;

/// Fake Script Generator 配置
#[derive(Debug, Clone)]
pub struct FakeScriptGeneratorConfig {
    /// 生成的对白轮数
    pub turns: usize,
    pub language: String,
}

impl Default for FakeScriptGeneratorConfig {
    fn default() -> Self {
        Self {
            turns: 12,
            language: "en-US".to_string(),
        }
    }
}

pub struct FakeScriptGenerator {
    config: FakeScriptGeneratorConfig,
}

impl FakeScriptGenerator {
    pub fn new(config: FakeScriptGeneratorConfig) -> Self {
        tracing::info!(turns = config.turns, "FakeScriptGenerator initialized");
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeScriptGeneratorConfig::default())
    }
}

/// 按句末标点切分
fn sentences(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch == '\n' {
            current.push(' ');
        } else {
            current.push(ch);
        }
        if matches!(ch, '.' | '?' | '!' | '。' | '？' | '！') {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                result.push(sentence);
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        result.push(rest.to_string());
    }
    result
}

#[async_trait]
impl ScriptGeneratorPort for FakeScriptGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedScript, GenerationError> {
        let hosts = request.lineup.hosts();
        if hosts.is_empty() {
            return Err(GenerationError::SchemaViolation(
                "Lineup has no hosts".to_string(),
            ));
        }

        let facts = sentences(&request.text);
        let total = self.config.turns.max(2);
        let turns = (0..total)
            .map(|i| {
                let host = &hosts[i % hosts.len()];
                let message = if i == 0 {
                    format!(
                        "Welcome to {}! I'm {}, and this is a {} episode, {}.",
                        request.title,
                        host.name,
                        request.style.style.display_name(),
                        request.style.tone.display_name().to_lowercase()
                    )
                } else if i == total - 1 {
                    format!("That's all for today. Thanks for listening, I'm {}.", host.name)
                } else if facts.is_empty() {
                    format!("Uhm, {} here. Let's keep going.", host.name)
                } else {
                    format!("So, here's the thing: {}", facts[(i - 1) % facts.len()])
                };
                (host.role.to_string(), message)
            })
            .collect();

        let script = Script::new(&self.config.language, turns, &request.lineup)?;
        let usage = GenerationUsage {
            prompt_tokens: request.text.split_whitespace().count() as u32,
            completion_tokens: script
                .turns()
                .iter()
                .map(|t| t.message().split_whitespace().count() as u32)
                .sum(),
        };

        tracing::debug!(turns = script.len(), "FakeScriptGenerator produced script");
        Ok(GeneratedScript { script, usage })
    }
}
