//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::domain::podcast::HostLineup;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 文档抽取配置
    #[serde(default)]
    pub document: DocumentConfig,

    /// 脚本生成配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 语音合成配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 节目配置
    #[serde(default)]
    pub podcast: PodcastConfig,

    /// Entra ID 凭据（未配置 api_key 的 Azure 服务使用）
    #[serde(default)]
    pub identity: IdentityConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传文件最大大小（字节），默认 20MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

fn default_max_upload_size() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 文档抽取实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentProvider {
    /// Azure Document Intelligence（纯文本仍在本地解码）
    #[default]
    Azure,
    /// 只接受纯文本 / Markdown
    Plain,
}

/// 文档抽取配置
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    #[serde(default)]
    pub provider: DocumentProvider,

    /// Document Intelligence endpoint
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_document_api_version")]
    pub api_version: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_document_timeout")]
    pub timeout_secs: u64,

    /// 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// 最大轮询次数
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_document_api_version() -> String {
    "2024-11-30".to_string()
}

fn default_document_timeout() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_max_polls() -> u32 {
    120
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            provider: DocumentProvider::default(),
            endpoint: String::new(),
            api_key: String::new(),
            api_version: default_document_api_version(),
            timeout_secs: default_document_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

/// 脚本生成实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    AzureOpenai,
    /// 离线确定性生成
    Fake,
}

/// 输入 token 计数使用的 BPE 编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEncoding {
    /// gpt-4o / gpt-4o-mini
    #[default]
    O200kBase,
    /// gpt-4 / gpt-35-turbo
    Cl100kBase,
}

impl TokenEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::O200kBase => "o200k_base",
            Self::Cl100kBase => "cl100k_base",
        }
    }
}

/// 脚本生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Azure OpenAI endpoint
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    /// 模型部署名
    #[serde(default = "default_deployment")]
    pub deployment: String,

    #[serde(default = "default_llm_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 输出 token 上限
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// 输入文本 token 上限（超出部分截断）
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// 与部署模型匹配的 token 编码
    #[serde(default)]
    pub token_encoding: TokenEncoding,

    /// 请求超时时间（秒）
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_deployment() -> String {
    "gpt-4o".to_string()
}

fn default_llm_api_version() -> String {
    "2024-10-21".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_max_input_tokens() -> usize {
    100_000
}

fn default_llm_timeout() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: String::new(),
            api_key: String::new(),
            deployment: default_deployment(),
            api_version: default_llm_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_input_tokens: default_max_input_tokens(),
            token_encoding: TokenEncoding::default(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// 语音合成实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechProvider {
    #[default]
    Azure,
    /// 离线正弦波合成
    Fake,
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub provider: SpeechProvider,

    /// Azure 区域，例如 eastus
    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub api_key: String,

    /// Speech 资源 ID，api_key 为空时用于 Entra ID 认证
    #[serde(default)]
    pub resource_id: String,

    /// 覆盖区域 endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// 输出格式
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,

    /// 同时进行的合成请求数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_output_format() -> String {
    "riff-48khz-16bit-mono-pcm".to_string()
}

fn default_speech_timeout() -> u64 {
    120
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: SpeechProvider::default(),
            region: String::new(),
            api_key: String::new(),
            resource_id: String::new(),
            endpoint: None,
            output_format: default_output_format(),
            timeout_secs: default_speech_timeout(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// 节目配置
#[derive(Debug, Clone, Deserialize)]
pub struct PodcastConfig {
    /// 未提供标题时使用
    #[serde(default = "default_title")]
    pub default_title: String,

    /// 目标时长（分钟）
    #[serde(default = "default_target_minutes")]
    pub target_minutes: u32,

    /// 主持人阵容
    #[serde(default)]
    pub hosts: HostLineup,
}

fn default_title() -> String {
    "AI in Action".to_string()
}

fn default_target_minutes() -> u32 {
    5
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            target_minutes: default_target_minutes(),
            hosts: HostLineup::default(),
        }
    }
}

/// Entra ID 凭据配置
///
/// 依次尝试服务主体、托管标识和 Azure CLI
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub tenant_id: String,

    /// 服务主体或用户分配托管标识的 client id
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// App Service / Container Apps 托管标识 endpoint
    #[serde(default)]
    pub identity_endpoint: String,

    #[serde(default)]
    pub identity_header: String,

    /// 为空时跳过 IMDS
    #[serde(default = "default_imds_endpoint")]
    pub imds_endpoint: String,

    #[serde(default = "default_use_azure_cli")]
    pub use_azure_cli: bool,

    /// 令牌请求超时（秒）
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_imds_endpoint() -> String {
    "http://169.254.169.254/metadata/identity/oauth2/token".to_string()
}

fn default_use_azure_cli() -> bool {
    true
}

fn default_identity_timeout() -> u64 {
    10
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            authority_host: default_authority_host(),
            identity_endpoint: String::new(),
            identity_header: String::new(),
            imds_endpoint: default_imds_endpoint(),
            use_azure_cli: default_use_azure_cli(),
            timeout_secs: default_identity_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
