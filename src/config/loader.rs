//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量（`PODCASTER_` 前缀）
//! 2. 配置文件（config.toml）
//! 3. Azure 标准环境变量（AZURE_OPENAI_KEY 等）
//! 4. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, DocumentProvider, LlmProvider, SpeechProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 可作为默认值的 Azure 标准环境变量
const AZURE_ENV_FALLBACKS: &[(&str, &str)] = &[
    ("document.endpoint", "DOCUMENTINTELLIGENCE_ENDPOINT"),
    ("document.api_key", "DOCUMENTINTELLIGENCE_API_KEY"),
    ("llm.endpoint", "AZURE_OPENAI_ENDPOINT"),
    ("llm.api_key", "AZURE_OPENAI_KEY"),
    ("llm.deployment", "AZURE_OPENAI_MODEL_DEPLOYMENT"),
    ("speech.region", "AZURE_SPEECH_REGION"),
    ("speech.api_key", "AZURE_SPEECH_KEY"),
    ("speech.resource_id", "AZURE_SPEECH_RESOURCE_ID"),
    ("identity.tenant_id", "AZURE_TENANT_ID"),
    ("identity.client_id", "AZURE_CLIENT_ID"),
    ("identity.client_secret", "AZURE_CLIENT_SECRET"),
    ("identity.authority_host", "AZURE_AUTHORITY_HOST"),
    ("identity.identity_endpoint", "IDENTITY_ENDPOINT"),
    ("identity.identity_header", "IDENTITY_HEADER"),
];

/// 加载应用配置
///
/// # 环境变量示例
/// - `PODCASTER_SERVER__PORT=8080`
/// - `PODCASTER_LLM__PROVIDER=fake`
/// - `PODCASTER_SPEECH__MAX_CONCURRENT=8`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("server.max_upload_size", 20 * 1024 * 1024)?
        .set_default("document.provider", "azure")?
        .set_default("document.api_version", "2024-11-30")?
        .set_default("document.timeout_secs", 60)?
        .set_default("document.poll_interval_ms", 1000)?
        .set_default("document.max_polls", 120)?
        .set_default("llm.provider", "azure_openai")?
        .set_default("llm.deployment", "gpt-4o")?
        .set_default("llm.api_version", "2024-10-21")?
        .set_default("llm.temperature", 0.7)?
        .set_default("llm.max_tokens", 8000)?
        .set_default("llm.max_input_tokens", 100_000)?
        .set_default("llm.token_encoding", "o200k_base")?
        .set_default("llm.timeout_secs", 300)?
        .set_default("speech.provider", "azure")?
        .set_default("speech.output_format", "riff-48khz-16bit-mono-pcm")?
        .set_default("speech.timeout_secs", 120)?
        .set_default("speech.max_concurrent", 4)?
        .set_default("podcast.default_title", "AI in Action")?
        .set_default("podcast.target_minutes", 5)?
        .set_default("identity.authority_host", "https://login.microsoftonline.com")?
        .set_default(
            "identity.imds_endpoint",
            "http://169.254.169.254/metadata/identity/oauth2/token",
        )?
        .set_default("identity.use_azure_cli", true)?
        .set_default("identity.timeout_secs", 10)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. Azure 标准环境变量作为默认值
    for (key, var) in AZURE_ENV_FALLBACKS {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_default(*key, value)?;
        }
    }

    // 3. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 4. 环境变量（最高优先级）
    // 层级分隔符: __ (双下划线)，例如 PODCASTER_LLM__API_KEY
    builder = builder.add_source(
        Environment::with_prefix("PODCASTER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn require(value: &str, name: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot be empty",
            name
        )));
    }
    Ok(())
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }
    if config.server.max_upload_size == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_size cannot be 0".to_string(),
        ));
    }

    if config.document.provider == DocumentProvider::Azure {
        require(&config.document.endpoint, "document.endpoint")?;
        if config.document.max_polls == 0 {
            return Err(ConfigError::ValidationError(
                "document.max_polls must be at least 1".to_string(),
            ));
        }
    }

    if config.llm.provider == LlmProvider::AzureOpenai {
        require(&config.llm.endpoint, "llm.endpoint")?;
        require(&config.llm.deployment, "llm.deployment")?;
    }
    if config.llm.max_input_tokens == 0 {
        return Err(ConfigError::ValidationError(
            "llm.max_input_tokens must be at least 1".to_string(),
        ));
    }

    if config.speech.provider == SpeechProvider::Azure {
        // 无 key 时走 Entra ID，Speech 令牌需要资源 ID
        if config.speech.api_key.trim().is_empty() {
            require(&config.speech.resource_id, "speech.resource_id")?;
        }
        if config.speech.endpoint.is_none() {
            require(&config.speech.region, "speech.region")?;
        }
    }
    if config.speech.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "speech.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.podcast.target_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "podcast.target_minutes must be at least 1".to_string(),
        ));
    }
    config
        .podcast
        .hosts
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("podcast.hosts: {}", e)))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志，不输出密钥）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Max Upload Size: {} bytes", config.server.max_upload_size);
    tracing::info!("Document Provider: {:?}", config.document.provider);
    if config.document.provider == DocumentProvider::Azure {
        tracing::info!("Document Endpoint: {}", config.document.endpoint);
    }
    tracing::info!("LLM Provider: {:?}", config.llm.provider);
    if config.llm.provider == LlmProvider::AzureOpenai {
        tracing::info!("LLM Endpoint: {}", config.llm.endpoint);
        tracing::info!("LLM Deployment: {}", config.llm.deployment);
    }
    tracing::info!(
        "LLM Max Input Tokens: {} ({})",
        config.llm.max_input_tokens,
        config.llm.token_encoding.as_str()
    );
    tracing::info!("Speech Provider: {:?}", config.speech.provider);
    if config.speech.provider == SpeechProvider::Azure {
        tracing::info!("Speech Region: {}", config.speech.region);
        tracing::info!("Speech Output Format: {}", config.speech.output_format);
    }
    tracing::info!("Speech Max Concurrent: {}", config.speech.max_concurrent);
    for host in config.podcast.hosts.hosts() {
        tracing::info!("Host {}: {} ({})", host.role, host.name, host.voice);
    }
    let keyless = [
        (DocumentProvider::Azure == config.document.provider, &config.document.api_key, "document"),
        (LlmProvider::AzureOpenai == config.llm.provider, &config.llm.api_key, "llm"),
        (SpeechProvider::Azure == config.speech.provider, &config.speech.api_key, "speech"),
    ]
    .into_iter()
    .filter(|(azure, key, _)| *azure && key.is_empty())
    .map(|(_, _, name)| name)
    .collect::<Vec<_>>();
    if !keyless.is_empty() {
        tracing::info!("Entra ID Auth: {}", keyless.join(", "));
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
