//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现，按配置选择具体提供方

pub mod document;
pub mod identity;
pub mod llm;
pub mod speech;

use std::sync::Arc;

use crate::application::ports::{
    DocumentExtractorPort, ExtractionError, GenerationError, ScriptGeneratorPort,
    SpeechSynthesizerPort, SynthesisError,
};
use crate::config::{
    DocumentConfig, DocumentProvider, IdentityConfig, LlmConfig, LlmProvider, SpeechConfig,
    SpeechProvider,
};

use identity::{AzureAuth, CredentialError, EntraIdConfig, EntraIdCredential, TokenCredential};

pub use document::*;
pub use llm::*;
pub use speech::*;

/// 构建 Entra ID 凭据链
///
/// 只在第一次需要令牌时才访问网络
pub fn build_credential(
    config: &IdentityConfig,
) -> Result<Arc<dyn TokenCredential>, CredentialError> {
    let credential = EntraIdCredential::new(EntraIdConfig {
        tenant_id: config.tenant_id.clone(),
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
        authority_host: config.authority_host.clone(),
        identity_endpoint: config.identity_endpoint.clone(),
        identity_header: config.identity_header.clone(),
        imds_endpoint: config.imds_endpoint.clone(),
        use_azure_cli: config.use_azure_cli,
        timeout_secs: config.timeout_secs,
    })?;
    Ok(Arc::new(credential))
}

/// 构建文档抽取器
///
/// `plain` 只接受纯文本；`azure` 在纯文本之外接入 Document Intelligence
pub fn build_document_extractor(
    config: &DocumentConfig,
    credential: &Arc<dyn TokenCredential>,
) -> Result<Arc<dyn DocumentExtractorPort>, ExtractionError> {
    let mut extractors: Vec<Arc<dyn DocumentExtractorPort>> =
        vec![Arc::new(PlainTextExtractor::new())];

    if config.provider == DocumentProvider::Azure {
        let azure_config = AzureDocumentIntelligenceConfig {
            api_version: config.api_version.clone(),
            timeout_secs: config.timeout_secs,
            ..AzureDocumentIntelligenceConfig::new(&config.endpoint, &config.api_key)
        }
        .with_auth(AzureAuth::from_key_or_credential(&config.api_key, credential))
        .with_polling(config.poll_interval_ms, config.max_polls);
        extractors.push(Arc::new(AzureDocumentIntelligence::new(azure_config)?));
    }

    tracing::info!(provider = ?config.provider, "Document extractor ready");
    Ok(Arc::new(ExtractorRouter::new(extractors)))
}

/// 构建脚本生成器
pub fn build_script_generator(
    config: &LlmConfig,
    credential: &Arc<dyn TokenCredential>,
) -> Result<Arc<dyn ScriptGeneratorPort>, GenerationError> {
    let generator: Arc<dyn ScriptGeneratorPort> = match config.provider {
        LlmProvider::AzureOpenai => {
            let azure_config = AzureOpenAiConfig {
                api_version: config.api_version.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                timeout_secs: config.timeout_secs,
                ..AzureOpenAiConfig::new(&config.endpoint, &config.api_key)
            }
            .with_deployment(&config.deployment)
            .with_auth(AzureAuth::from_key_or_credential(&config.api_key, credential));
            Arc::new(AzureOpenAiClient::new(azure_config)?)
        }
        LlmProvider::Fake => {
            tracing::warn!("Using fake script generator, scripts are canned");
            Arc::new(FakeScriptGenerator::with_defaults())
        }
    };

    tracing::info!(provider = ?config.provider, "Script generator ready");
    Ok(generator)
}

/// 构建语音合成器
pub fn build_speech_synthesizer(
    config: &SpeechConfig,
    credential: &Arc<dyn TokenCredential>,
) -> Result<Arc<dyn SpeechSynthesizerPort>, SynthesisError> {
    let synthesizer: Arc<dyn SpeechSynthesizerPort> = match config.provider {
        SpeechProvider::Azure => {
            let mut azure_config = AzureSpeechConfig {
                timeout_secs: config.timeout_secs,
                ..AzureSpeechConfig::new(&config.region, &config.api_key)
            }
            .with_output_format(&config.output_format)
            .with_auth(
                AzureAuth::from_key_or_credential(&config.api_key, credential),
                &config.resource_id,
            );
            if let Some(endpoint) = &config.endpoint {
                azure_config = azure_config.with_endpoint(endpoint);
            }
            Arc::new(AzureSpeechClient::new(azure_config)?)
        }
        SpeechProvider::Fake => {
            tracing::warn!("Using fake speech synthesizer, audio is a sine tone");
            Arc::new(FakeSpeechSynthesizer::with_defaults())
        }
    };

    tracing::info!(
        provider = ?config.provider,
        encoding = ?synthesizer.encoding(),
        "Speech synthesizer ready"
    );
    Ok(synthesizer)
}
