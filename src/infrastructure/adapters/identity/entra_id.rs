//! Microsoft Entra ID 凭据链
//!
//! 按顺序尝试：
//! 1. 服务主体（tenant_id + client_id + client_secret）
//! 2. 托管标识（App Service / Container Apps 的 IDENTITY_ENDPOINT，否则 IMDS）
//! 3. Azure CLI（`az account get-access-token`）
//!
//! 第一个成功的来源会被记住，之后只使用它。令牌按 scope 缓存，过期前 5 分钟刷新。

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{AccessToken, CredentialError, TokenCredential};

const REFRESH_MARGIN_MINUTES: i64 = 5;
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_API_VERSION: &str = "2018-02-01";
const NO_PREFERRED_SOURCE: usize = usize::MAX;

/// Entra ID 凭据配置
#[derive(Debug, Clone)]
pub struct EntraIdConfig {
    pub tenant_id: String,
    /// 服务主体或用户分配托管标识的 client id
    pub client_id: String,
    pub client_secret: String,
    pub authority_host: String,
    /// App Service / Container Apps 注入的 IDENTITY_ENDPOINT
    pub identity_endpoint: String,
    pub identity_header: String,
    pub imds_endpoint: String,
    pub use_azure_cli: bool,
    /// 令牌请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for EntraIdConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            authority_host: "https://login.microsoftonline.com".to_string(),
            identity_endpoint: String::new(),
            identity_header: String::new(),
            imds_endpoint: "http://169.254.169.254/metadata/identity/oauth2/token".to_string(),
            use_azure_cli: true,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    ClientSecret,
    AppServiceIdentity,
    Imds,
    AzureCli,
}

impl Source {
    fn name(&self) -> &'static str {
        match self {
            Source::ClientSecret => "client_secret",
            Source::AppServiceIdentity => "app_service_identity",
            Source::Imds => "imds",
            Source::AzureCli => "azure_cli",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(i64),
    Text(String),
}

impl Seconds {
    fn value(&self) -> Option<i64> {
        match self {
            Seconds::Number(n) => Some(*n),
            Seconds::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Seconds>,
    #[serde(default)]
    expires_on: Option<Seconds>,
}

impl TokenResponse {
    fn into_access_token(self) -> Result<AccessToken, CredentialError> {
        let expires_at = if let Some(on) = self.expires_on.as_ref().and_then(Seconds::value) {
            DateTime::<Utc>::from_timestamp(on, 0)
        } else {
            self.expires_in
                .as_ref()
                .and_then(Seconds::value)
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs))
        }
        .ok_or_else(|| CredentialError::InvalidResponse("Missing token expiry".to_string()))?;

        Ok(AccessToken {
            token: self.access_token,
            expires_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// 本地时间，例如 "2024-05-01 12:00:00.000000"
    #[serde(default)]
    expires_on: Option<String>,
    /// 新版 CLI 额外给出 epoch 秒
    #[serde(rename = "expires_on", default)]
    expires_on_epoch: Option<i64>,
}

/// Entra ID 凭据
pub struct EntraIdCredential {
    client: Client,
    config: EntraIdConfig,
    sources: Vec<Source>,
    preferred: AtomicUsize,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl EntraIdCredential {
    pub fn new(config: EntraIdConfig) -> Result<Self, CredentialError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CredentialError::NetworkError(e.to_string()))?;

        let mut sources = Vec::new();
        if !config.tenant_id.is_empty()
            && !config.client_id.is_empty()
            && !config.client_secret.is_empty()
        {
            sources.push(Source::ClientSecret);
        }
        if !config.identity_endpoint.is_empty() {
            sources.push(Source::AppServiceIdentity);
        } else if !config.imds_endpoint.is_empty() {
            sources.push(Source::Imds);
        }
        if config.use_azure_cli {
            sources.push(Source::AzureCli);
        }

        tracing::debug!(
            sources = ?sources.iter().map(Source::name).collect::<Vec<_>>(),
            "Entra ID credential chain configured"
        );

        Ok(Self {
            client,
            config,
            sources,
            preferred: AtomicUsize::new(NO_PREFERRED_SOURCE),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn map_send_error(e: reqwest::Error) -> CredentialError {
        if e.is_timeout() || e.is_connect() {
            CredentialError::Unavailable(e.to_string())
        } else {
            CredentialError::NetworkError(e.to_string())
        }
    }

    async fn read_token(response: Response) -> Result<AccessToken, CredentialError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Rejected(format!("HTTP {}: {}", status, body)));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?
            .into_access_token()
    }

    fn optional_client_id(&self) -> Vec<(&'static str, &str)> {
        if self.config.client_id.is_empty() {
            Vec::new()
        } else {
            vec![("client_id", self.config.client_id.as_str())]
        }
    }

    async fn client_secret_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_host.trim_end_matches('/'),
            self.config.tenant_id
        );
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope),
        ];

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::read_token(response).await
    }

    async fn app_service_token(&self, resource: &str) -> Result<AccessToken, CredentialError> {
        let response = self
            .client
            .get(&self.config.identity_endpoint)
            .query(&[("api-version", APP_SERVICE_API_VERSION), ("resource", resource)])
            .query(&self.optional_client_id())
            .header("X-IDENTITY-HEADER", &self.config.identity_header)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::read_token(response).await
    }

    async fn imds_token(&self, resource: &str) -> Result<AccessToken, CredentialError> {
        let response = self
            .client
            .get(&self.config.imds_endpoint)
            .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)])
            .query(&self.optional_client_id())
            .header("Metadata", "true")
            .send()
            .await
            .map_err(Self::map_send_error)?;
        Self::read_token(response).await
    }

    async fn azure_cli_token(&self, resource: &str) -> Result<AccessToken, CredentialError> {
        let output = tokio::process::Command::new("az")
            .args(["account", "get-access-token", "--output", "json", "--resource", resource])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CredentialError::Unavailable(format!("Azure CLI not found: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CredentialError::Unavailable(format!(
                "az account get-access-token failed: {}",
                stderr.trim()
            )));
        }

        let token: CliToken = serde_json::from_slice(&output.stdout)
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;

        let expires_at = match token.expires_on_epoch {
            Some(epoch) => DateTime::<Utc>::from_timestamp(epoch, 0),
            None => token
                .expires_on
                .as_deref()
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
                .and_then(|naive| naive.and_local_timezone(Local).single())
                .map(|local| local.with_timezone(&Utc)),
        }
        .ok_or_else(|| CredentialError::InvalidResponse("Missing token expiry".to_string()))?;

        Ok(AccessToken {
            token: token.access_token,
            expires_at,
        })
    }

    async fn fetch(&self, source: Source, scope: &str) -> Result<AccessToken, CredentialError> {
        let resource = scope.trim_end_matches("/.default");
        match source {
            Source::ClientSecret => self.client_secret_token(scope).await,
            Source::AppServiceIdentity => self.app_service_token(resource).await,
            Source::Imds => self.imds_token(resource).await,
            Source::AzureCli => self.azure_cli_token(resource).await,
        }
    }

    async fn fetch_from_chain(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let preferred = self.preferred.load(Ordering::Acquire);
        if let Some(source) = self.sources.get(preferred) {
            return self.fetch(*source, scope).await;
        }

        let mut failures = Vec::new();
        for (index, source) in self.sources.iter().enumerate() {
            match self.fetch(*source, scope).await {
                Ok(token) => {
                    tracing::info!(source = source.name(), "Acquired Entra ID token");
                    self.preferred.store(index, Ordering::Release);
                    return Ok(token);
                }
                Err(e) => {
                    tracing::debug!(source = source.name(), error = %e, "Entra ID source failed");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no credential source configured".to_string());
        }
        Err(CredentialError::Unavailable(failures.join("; ")))
    }
}

#[async_trait]
impl TokenCredential for EntraIdCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        // 持锁获取，避免并发合成同时刷新
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(scope) {
            if !token.expires_within(ChronoDuration::minutes(REFRESH_MARGIN_MINUTES)) {
                return Ok(token.clone());
            }
        }

        let token = self.fetch_from_chain(scope).await?;
        cache.insert(scope.to_string(), token.clone());
        Ok(token)
    }
}
