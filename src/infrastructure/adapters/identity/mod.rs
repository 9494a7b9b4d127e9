//! Azure 认证
//!
//! 配置了 key 时使用订阅 key 头，否则通过 Microsoft Entra ID 获取访问令牌

mod entra_id;

pub use entra_id::{EntraIdConfig, EntraIdCredential};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Cognitive Services 通用 scope
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// 访问令牌
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// 距过期不足 `margin` 时视为需要刷新
    pub fn expires_within(&self, margin: ChronoDuration) -> bool {
        self.expires_at - margin <= Utc::now()
    }
}

/// 凭据错误
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential unavailable: {0}")]
    Unavailable(String),

    #[error("Token request rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

/// 令牌来源
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// 单个 Azure 服务的认证方式
#[derive(Clone)]
pub enum AzureAuth {
    /// 订阅 key，放在服务自己的 key 头里
    ApiKey(String),
    /// Entra ID bearer token
    EntraId {
        credential: Arc<dyn TokenCredential>,
        scope: String,
    },
}

impl fmt::Debug for AzureAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AzureAuth::ApiKey(_) => f.write_str("ApiKey(***)"),
            AzureAuth::EntraId { scope, .. } => {
                f.debug_struct("EntraId").field("scope", scope).finish()
            }
        }
    }
}

impl Default for AzureAuth {
    fn default() -> Self {
        AzureAuth::ApiKey(String::new())
    }
}

impl AzureAuth {
    /// key 非空时用 key，否则退回 Entra ID
    pub fn from_key_or_credential(api_key: &str, credential: &Arc<dyn TokenCredential>) -> Self {
        if api_key.trim().is_empty() {
            AzureAuth::EntraId {
                credential: credential.clone(),
                scope: COGNITIVE_SERVICES_SCOPE.to_string(),
            }
        } else {
            AzureAuth::ApiKey(api_key.to_string())
        }
    }

    pub fn is_entra_id(&self) -> bool {
        matches!(self, AzureAuth::EntraId { .. })
    }

    /// 为请求加上认证头
    pub async fn apply(
        &self,
        request: RequestBuilder,
        key_header: &str,
    ) -> Result<RequestBuilder, CredentialError> {
        match self {
            AzureAuth::ApiKey(key) => Ok(request.header(key_header, key)),
            AzureAuth::EntraId { credential, scope } => {
                let token = credential.get_token(scope).await?;
                Ok(request.header(AUTHORIZATION, format!("Bearer {}", token.token)))
            }
        }
    }

    /// Speech 服务的 Entra ID 令牌格式为 `aad#{resource_id}#{token}`
    pub async fn apply_speech(
        &self,
        request: RequestBuilder,
        key_header: &str,
        resource_id: &str,
    ) -> Result<RequestBuilder, CredentialError> {
        match self {
            AzureAuth::ApiKey(key) => Ok(request.header(key_header, key)),
            AzureAuth::EntraId { credential, scope } => {
                let token = credential.get_token(scope).await?;
                Ok(request.header(
                    AUTHORIZATION,
                    format!("Bearer aad#{}#{}", resource_id, token.token),
                ))
            }
        }
    }
}

/// 固定令牌
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct StaticTokenCredential {
    token: String,
}

#[cfg(test)]
impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
    }
}
