//! Azure OpenAI Script Generator - 结构化输出的 chat completion
//!
//! 外部 API:
//! POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...
//! Request: messages + response_format(json_schema, strict)
//! Response: choices[0].message.content 为符合 schema 的 JSON

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    GeneratedScript, GenerationError, GenerationRequest, GenerationUsage, ScriptGeneratorPort,
};

use crate::infrastructure::adapters::identity::AzureAuth;

use super::prompt::{parse_script, script_json_schema, system_prompt, user_message};

/// Azure OpenAI 客户端配置
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    /// 资源 endpoint，例如 https://xxx.openai.azure.com
    pub endpoint: String,
    /// 订阅 key 或 Entra ID
    pub auth: AzureAuth,
    /// 模型部署名
    pub deployment: String,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            auth: AzureAuth::default(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-10-21".to_string(),
            temperature: 0.7,
            max_tokens: 8000,
            timeout_secs: 300,
        }
    }
}

impl AzureOpenAiConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: AzureAuth::ApiKey(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, auth: AzureAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Azure OpenAI 客户端
pub struct AzureOpenAiClient {
    client: Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(request),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(&request.title, &request.text),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: serde_json::json!({
                "type": "json_schema",
                "json_schema": script_json_schema(&request.lineup),
            }),
        }
    }
}

const API_KEY_HEADER: &str = "api-key";

/// 截断过长的错误信息
fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((pos, _)) => &body[..pos],
        None => body,
    }
}

#[async_trait]
impl ScriptGeneratorPort for AzureOpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedScript, GenerationError> {
        let body = self.build_request(&request);

        tracing::debug!(
            deployment = %self.config.deployment,
            text_len = request.text.len(),
            title = %request.title,
            "Sending chat completion request"
        );

        let http_request = self.client.post(self.completions_url()).json(&body);
        let response = self
            .config
            .auth
            .apply(http_request, API_KEY_HEADER)
            .await
            .map_err(|e| GenerationError::AuthenticationFailed(e.to_string()))?
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else if e.is_connect() {
                    GenerationError::NetworkError(format!("Cannot connect to Azure OpenAI: {}", e))
                } else {
                    GenerationError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerationError::AuthenticationFailed(format!("HTTP {}", status))
                }
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited,
                StatusCode::BAD_REQUEST if text.contains("content_filter") => {
                    GenerationError::ContentFiltered(truncate_body(&text).to_string())
                }
                _ => GenerationError::ServiceError(format!(
                    "HTTP {}: {}",
                    status,
                    truncate_body(&text)
                )),
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("No choices in response".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(GenerationError::ContentFiltered(refusal));
        }
        match choice.finish_reason.as_deref() {
            Some("content_filter") => {
                return Err(GenerationError::ContentFiltered(
                    "Completion stopped by content filter".to_string(),
                ));
            }
            Some("length") => {
                return Err(GenerationError::SchemaViolation(format!(
                    "Completion truncated at max_tokens={}",
                    self.config.max_tokens
                )));
            }
            _ => {}
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| GenerationError::InvalidResponse("Empty message content".to_string()))?;
        let script = parse_script(&content, &request.lineup)?;

        let usage = completion
            .usage
            .map(|u| GenerationUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        tracing::info!(
            turns = script.len(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Chat completion succeeded"
        );

        Ok(GeneratedScript { script, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::podcast::{HostLineup, StyleConfig};
    use mockito::Matcher;

    const COMPLETIONS_PATH: &str = r"^/openai/deployments/gpt-4o/chat/completions";

    fn client(endpoint: &str) -> AzureOpenAiClient {
        AzureOpenAiClient::new(AzureOpenAiConfig::new(endpoint, "secret")).unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            text: "Interest rates went up.".to_string(),
            style: StyleConfig::default(),
            title: "Rates".to_string(),
            target_minutes: 5,
            lineup: HostLineup::default(),
        }
    }

    fn completion(content: &str, finish_reason: &str) -> String {
        serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": finish_reason
            }],
            "usage": {"prompt_tokens": 1200, "completion_tokens": 800, "total_tokens": 2000}
        })
        .to_string()
    }

    #[test]
    fn test_config_default() {
        let config = AzureOpenAiConfig::default();
        assert_eq!(config.api_version, "2024-10-21");
        assert_eq!(config.max_tokens, 8000);
        assert_eq!(config.deployment, "gpt-4o");
    }

    #[tokio::test]
    async fn test_generate_parses_script_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let content = r#"{"config":{"language":"en-US"},"script":[{"speaker":"speaker_1","message":"Hello and welcome!"},{"speaker":"speaker_2","message":"Glad to be here."}]}"#;
        let mock = server
            .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
            .match_query(Matcher::UrlEncoded("api-version".into(), "2024-10-21".into()))
            .match_header("api-key", "secret")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({
                    "temperature": 0.7,
                    "max_tokens": 8000,
                    "response_format": {
                        "type": "json_schema",
                        "json_schema": {"name": "podcast", "strict": true}
                    }
                })),
                Matcher::Regex(
                    "<title>Rates</title><documents><document>Interest rates went up.</document></documents>"
                        .to_string(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(content, "stop"))
            .create_async()
            .await;

        let generated = client(&server.url()).generate(request()).await.unwrap();

        assert_eq!(generated.script.len(), 2);
        assert_eq!(generated.script.turns()[0].message(), "Hello and welcome!");
        assert_eq!(generated.usage.prompt_tokens, 1200);
        assert_eq!(generated.usage.completion_tokens, 800);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_speaker_is_schema_violation() {
        let mut server = mockito::Server::new_async().await;
        let content = r#"{"config":{"language":"en-US"},"script":[{"speaker":"Ava","message":"Hi"}]}"#;
        server
            .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
            .with_status(200)
            .with_body(completion(content, "stop"))
            .create_async()
            .await;

        assert!(matches!(
            client(&server.url()).generate(request()).await,
            Err(GenerationError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_content_filter_finish_reason() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
            .with_status(200)
            .with_body(completion("", "content_filter"))
            .create_async()
            .await;

        assert!(matches!(
            client(&server.url()).generate(request()).await,
            Err(GenerationError::ContentFiltered(_))
        ));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (429, "{}", "rate"),
            (401, "{}", "auth"),
            (400, r#"{"error":{"code":"content_filter","message":"filtered"}}"#, "filter"),
            (500, "boom", "service"),
        ];

        for (status, body, kind) in cases {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
                .with_status(status)
                .with_body(body)
                .create_async()
                .await;

            let err = client(&server.url()).generate(request()).await.unwrap_err();
            let ok = match kind {
                "rate" => matches!(err, GenerationError::RateLimited),
                "auth" => matches!(err, GenerationError::AuthenticationFailed(_)),
                "filter" => matches!(err, GenerationError::ContentFiltered(_)),
                _ => matches!(err, GenerationError::ServiceError(_)),
            };
            assert!(ok, "status {} mapped to {:?}", status, err);
        }
    }

    #[tokio::test]
    async fn test_entra_id_bearer_token_without_key() {
        use crate::infrastructure::adapters::identity::{StaticTokenCredential, TokenCredential};
        use std::sync::Arc;

        let mut server = mockito::Server::new_async().await;
        let content = r#"{"config":{"language":"en-US"},"script":[{"speaker":"speaker_1","message":"Hi"}]}"#;
        let mock = server
            .mock("POST", Matcher::Regex(COMPLETIONS_PATH.to_string()))
            .match_header("authorization", "Bearer entra-token")
            .match_header(API_KEY_HEADER, Matcher::Missing)
            .with_status(200)
            .with_body(completion(content, "stop"))
            .create_async()
            .await;

        let credential: Arc<dyn TokenCredential> = Arc::new(StaticTokenCredential::new("entra-token"));
        let config = AzureOpenAiConfig::new(server.url(), "")
            .with_auth(AzureAuth::from_key_or_credential("", &credential));
        let generated = AzureOpenAiClient::new(config)
            .unwrap()
            .generate(request())
            .await
            .unwrap();

        assert_eq!(generated.script.len(), 1);
        mock.assert_async().await;
    }
}
