//! Azure Speech Client - 语音合成 REST API
//!
//! 外部 API:
//! POST https://{region}.tts.speech.microsoft.com/cognitiveservices/v1
//! Request: SSML (application/ssml+xml)，X-Microsoft-OutputFormat 指定输出格式
//! Response: 音频字节

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::application::ports::{
    SpeechSynthesizerPort, SynthesisError, SynthesisRequest, SynthesizedAudio,
};
use crate::domain::build_turn_ssml;
use crate::domain::podcast::{wav_duration_ms, AudioEncoding};
use crate::infrastructure::adapters::identity::{AzureAuth, CredentialError};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// Azure Speech 客户端配置
#[derive(Debug, Clone)]
pub struct AzureSpeechConfig {
    pub region: String,
    /// 订阅 key 或 Entra ID
    pub auth: AzureAuth,
    /// Speech 资源 ID，Entra ID 认证时必需
    pub resource_id: String,
    /// 输出格式，例如 riff-48khz-16bit-mono-pcm
    pub output_format: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 覆盖默认的区域 endpoint（不含路径）
    pub endpoint: Option<String>,
}

impl Default for AzureSpeechConfig {
    fn default() -> Self {
        Self {
            region: "eastus".to_string(),
            auth: AzureAuth::default(),
            resource_id: String::new(),
            output_format: "riff-48khz-16bit-mono-pcm".to_string(),
            timeout_secs: 120,
            endpoint: None,
        }
    }
}

impl AzureSpeechConfig {
    pub fn new(region: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            auth: AzureAuth::ApiKey(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, auth: AzureAuth, resource_id: impl Into<String>) -> Self {
        self.auth = auth;
        self.resource_id = resource_id.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }
}

/// Azure Speech 客户端
pub struct AzureSpeechClient {
    client: Client,
    config: AzureSpeechConfig,
    encoding: AudioEncoding,
}

impl AzureSpeechClient {
    pub fn new(config: AzureSpeechConfig) -> Result<Self, SynthesisError> {
        if config.auth.is_entra_id() && config.resource_id.trim().is_empty() {
            return Err(SynthesisError::AuthenticationFailed(
                "Entra ID authentication requires the Speech resource id".to_string(),
            ));
        }

        let encoding = AudioEncoding::from_output_format(&config.output_format).ok_or_else(|| {
            SynthesisError::Rejected(format!(
                "Unsupported output format: {} (use a riff-* or *-mp3 format)",
                config.output_format
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("podcaster")
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            encoding,
        })
    }

    fn base_url(&self) -> String {
        match &self.config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.tts.speech.microsoft.com", self.config.region),
        }
    }

    fn synthesis_url(&self) -> String {
        format!("{}/cognitiveservices/v1", self.base_url())
    }

    fn voices_url(&self) -> String {
        format!("{}/cognitiveservices/voices/list", self.base_url())
    }

    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, CredentialError> {
        self.config
            .auth
            .apply_speech(request, SUBSCRIPTION_KEY_HEADER, &self.config.resource_id)
            .await
    }
}

#[async_trait]
impl SpeechSynthesizerPort for AzureSpeechClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesizedAudio, SynthesisError> {
        let ssml = build_turn_ssml(&request.language, &request.voice, &request.text);

        tracing::debug!(
            voice = %request.voice,
            text_len = request.text.len(),
            output_format = %self.config.output_format,
            "Sending speech synthesis request"
        );

        let http_request = self
            .client
            .post(self.synthesis_url())
            .header(OUTPUT_FORMAT_HEADER, &self.config.output_format)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .body(ssml);
        let response = self
            .authorize(http_request)
            .await
            .map_err(|e| SynthesisError::AuthenticationFailed(e.to_string()))?
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::NetworkError(format!("Cannot connect to Azure Speech: {}", e))
                } else {
                    SynthesisError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SynthesisError::AuthenticationFailed(format!("HTTP {}", status))
                }
                StatusCode::TOO_MANY_REQUESTS => SynthesisError::RateLimited,
                StatusCode::BAD_REQUEST => SynthesisError::Rejected(format!(
                    "voice {}: {}",
                    request.voice, text
                )),
                _ => SynthesisError::ServiceError(format!("HTTP {}: {}", status, text)),
            });
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();
        if audio_data.is_empty() {
            return Err(SynthesisError::InvalidResponse("Empty audio body".to_string()));
        }

        let duration_ms = match self.encoding {
            AudioEncoding::Wav => Some(wav_duration_ms(&audio_data).ok_or_else(|| {
                SynthesisError::InvalidResponse("Response is not valid RIFF/WAV".to_string())
            })?),
            AudioEncoding::Mp3 => None,
        };

        tracing::debug!(
            voice = %request.voice,
            audio_size = audio_data.len(),
            duration_ms = ?duration_ms,
            "Speech synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data,
            duration_ms,
        })
    }

    fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    async fn health_check(&self) -> bool {
        let http_request = self
            .client
            .get(self.voices_url())
            .timeout(Duration::from_secs(5));
        let http_request = match self.authorize(http_request).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Speech health check could not authenticate");
                return false;
            }
        };
        match http_request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::podcast::constant_wav;
    use mockito::Matcher;

    fn client(endpoint: &str) -> AzureSpeechClient {
        AzureSpeechClient::new(AzureSpeechConfig::new("westus", "speech-key").with_endpoint(endpoint))
            .unwrap()
    }

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice: "en-US-Ava:DragonHDLatestNeural".to_string(),
            language: "en-US".to_string(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = AzureSpeechConfig::default();
        assert_eq!(config.output_format, "riff-48khz-16bit-mono-pcm");
        let client = AzureSpeechClient::new(AzureSpeechConfig::new("westeurope", "k")).unwrap();
        assert_eq!(
            client.synthesis_url(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(client.encoding(), AudioEncoding::Wav);
    }

    #[test]
    fn test_rejects_unknown_output_format() {
        let config = AzureSpeechConfig::new("westus", "k").with_output_format("ogg-24khz-16bit-mono-opus");
        assert!(matches!(
            AzureSpeechClient::new(config),
            Err(SynthesisError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_synthesize_posts_escaped_ssml() {
        let mut server = mockito::Server::new_async().await;
        let wav = constant_wav(48_000, 24_000, 3);
        let mock = server
            .mock("POST", "/cognitiveservices/v1")
            .match_header(SUBSCRIPTION_KEY_HEADER, "speech-key")
            .match_header(OUTPUT_FORMAT_HEADER, "riff-48khz-16bit-mono-pcm")
            .match_header("content-type", "application/ssml+xml")
            .match_body(Matcher::Regex(
                "<voice name='en-US-Ava:DragonHDLatestNeural'>Salt &amp; pepper</voice>".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "audio/wav")
            .with_body(wav.clone())
            .create_async()
            .await;

        let audio = client(&server.url()).synthesize(request("Salt & pepper")).await.unwrap();

        assert_eq!(audio.audio_data, wav);
        assert_eq!(audio.duration_ms, Some(500));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_wav_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/cognitiveservices/v1")
            .with_status(200)
            .with_body("garbage")
            .create_async()
            .await;

        assert!(matches!(
            client(&server.url()).synthesize(request("Hi")).await,
            Err(SynthesisError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [(400, "rejected"), (401, "auth"), (429, "rate"), (503, "service")];

        for (status, kind) in cases {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("POST", "/cognitiveservices/v1")
                .with_status(status)
                .with_body("error")
                .create_async()
                .await;

            let err = client(&server.url()).synthesize(request("Hi")).await.unwrap_err();
            let ok = match kind {
                "rejected" => matches!(err, SynthesisError::Rejected(_)),
                "auth" => matches!(err, SynthesisError::AuthenticationFailed(_)),
                "rate" => matches!(err, SynthesisError::RateLimited),
                _ => matches!(err, SynthesisError::ServiceError(_)),
            };
            assert!(ok, "status {} mapped to {:?}", status, err);
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/cognitiveservices/voices/list")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        assert!(client(&server.url()).health_check().await);
    }

    #[tokio::test]
    async fn test_entra_id_uses_aad_resource_token() {
        use crate::infrastructure::adapters::identity::{StaticTokenCredential, TokenCredential};
        use std::sync::Arc;

        let resource_id = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.CognitiveServices/accounts/speech";
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cognitiveservices/v1")
            .match_header("authorization", format!("Bearer aad#{}#entra-token", resource_id).as_str())
            .match_header(SUBSCRIPTION_KEY_HEADER, Matcher::Missing)
            .with_status(200)
            .with_body(constant_wav(48_000, 4_800, 1))
            .create_async()
            .await;

        let credential: Arc<dyn TokenCredential> = Arc::new(StaticTokenCredential::new("entra-token"));
        let auth = AzureAuth::from_key_or_credential("", &credential);
        let config = AzureSpeechConfig::new("westus", "")
            .with_endpoint(server.url())
            .with_auth(auth.clone(), resource_id);
        let audio = AzureSpeechClient::new(config)
            .unwrap()
            .synthesize(request("Hi"))
            .await
            .unwrap();
        assert_eq!(audio.duration_ms, Some(100));
        mock.assert_async().await;

        let missing_resource = AzureSpeechConfig::new("westus", "").with_auth(auth, "");
        assert!(matches!(
            AzureSpeechClient::new(missing_resource),
            Err(SynthesisError::AuthenticationFailed(_))
        ));
    }
}
