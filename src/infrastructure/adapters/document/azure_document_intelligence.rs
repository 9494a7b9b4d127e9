//! Azure Document Intelligence - prebuilt-layout 文档抽取
//!
//! 外部 API:
//! POST {endpoint}/documentintelligence/documentModels/prebuilt-layout:analyze
//!      ?api-version=...&outputContentFormat=markdown
//! Request: 文档原始字节
//! Response: 202 + Operation-Location，轮询 GET 直到 succeeded / failed

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{DocumentExtractorPort, ExtractionError};
use crate::domain::podcast::{Document, ExtractedText};
use crate::infrastructure::adapters::identity::{AzureAuth, CredentialError};

/// 交给 Document Intelligence 的媒体类型
pub const LAYOUT_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/bmp",
    "image/tiff",
    "text/html",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Document Intelligence 客户端配置
#[derive(Debug, Clone)]
pub struct AzureDocumentIntelligenceConfig {
    /// 资源 endpoint，例如 https://xxx.cognitiveservices.azure.com
    pub endpoint: String,
    /// 订阅 key 或 Entra ID
    pub auth: AzureAuth,
    pub api_version: String,
    /// 单次 HTTP 请求超时（秒）
    pub timeout_secs: u64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 最大轮询次数
    pub max_polls: u32,
}

impl Default for AzureDocumentIntelligenceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            auth: AzureAuth::default(),
            api_version: "2024-11-30".to_string(),
            timeout_secs: 60,
            poll_interval_ms: 1000,
            max_polls: 120,
        }
    }
}

impl AzureDocumentIntelligenceConfig {
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

    pub fn with_polling(mut self, interval_ms: u64, max_polls: u32) -> Self {
        self.poll_interval_ms = interval_ms;
        self.max_polls = max_polls;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    content: String,
    #[serde(default)]
    pages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Document Intelligence 客户端
pub struct AzureDocumentIntelligence {
    client: Client,
    config: AzureDocumentIntelligenceConfig,
}

impl AzureDocumentIntelligence {
    pub fn new(config: AzureDocumentIntelligenceConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/prebuilt-layout:analyze?api-version={}&outputContentFormat=markdown",
            self.config.endpoint.trim_end_matches('/'),
            self.config.api_version
        )
    }

    fn map_send_error(e: reqwest::Error) -> ExtractionError {
        if e.is_timeout() {
            ExtractionError::Timeout
        } else if e.is_connect() {
            ExtractionError::NetworkError(format!(
                "Cannot connect to Document Intelligence: {}",
                e
            ))
        } else {
            ExtractionError::NetworkError(e.to_string())
        }
    }

    fn map_credential_error(e: CredentialError) -> ExtractionError {
        ExtractionError::AuthenticationFailed(e.to_string())
    }

    async fn map_status_error(response: Response) -> ExtractionError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ExtractionError::AuthenticationFailed(format!("HTTP {}", status))
            }
            StatusCode::TOO_MANY_REQUESTS => ExtractionError::RateLimited,
            StatusCode::PAYLOAD_TOO_LARGE => ExtractionError::TooLarge(body),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ExtractionError::UnsupportedFormat(body),
            _ => ExtractionError::ServiceError(format!("HTTP {}: {}", status, body)),
        }
    }

    /// 提交分析，返回 Operation-Location
    async fn begin_analyze(&self, document: Document) -> Result<String, ExtractionError> {
        let url = self.analyze_url();
        tracing::debug!(
            url = %url,
            media_type = %document.media_type(),
            bytes = document.len(),
            "Submitting document for layout analysis"
        );

        let request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(document.into_bytes());
        let response = self
            .config
            .auth
            .apply(request, SUBSCRIPTION_KEY_HEADER)
            .await
            .map_err(Self::map_credential_error)?
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(Self::map_status_error(response).await);
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| {
                ExtractionError::InvalidResponse("Missing Operation-Location header".to_string())
            })
    }

    /// 轮询分析结果
    async fn poll_result(&self, operation_url: &str) -> Result<AnalyzeResult, ExtractionError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        for attempt in 1..=self.config.max_polls {
            tokio::time::sleep(interval).await;

            let response = self
                .config
                .auth
                .apply(self.client.get(operation_url), SUBSCRIPTION_KEY_HEADER)
                .await
                .map_err(Self::map_credential_error)?
                .send()
                .await
                .map_err(Self::map_send_error)?;

            if !response.status().is_success() {
                return Err(Self::map_status_error(response).await);
            }

            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

            match operation.status.as_str() {
                "succeeded" => {
                    return operation.analyze_result.ok_or_else(|| {
                        ExtractionError::InvalidResponse("Missing analyzeResult".to_string())
                    });
                }
                "failed" | "canceled" => {
                    let detail = operation
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| operation.status.clone());
                    return Err(ExtractionError::AnalysisFailed(detail));
                }
                status => {
                    tracing::trace!(attempt, status = %status, "Layout analysis still running");
                }
            }
        }

        Err(ExtractionError::PollingExhausted(self.config.max_polls))
    }
}

#[async_trait]
impl DocumentExtractorPort for AzureDocumentIntelligence {
    async fn extract(&self, document: Document) -> Result<ExtractedText, ExtractionError> {
        if !self.supports(document.media_type()) {
            return Err(ExtractionError::UnsupportedFormat(
                document.media_type().to_string(),
            ));
        }
        if document.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let operation_url = self.begin_analyze(document).await?;
        let result = self.poll_result(&operation_url).await?;
        let pages = result.pages.len() as u32;

        tracing::info!(
            pages,
            chars = result.content.chars().count(),
            "Layout analysis completed"
        );

        ExtractedText::new(result.content, pages).ok_or(ExtractionError::EmptyDocument)
    }

    fn supports(&self, media_type: &str) -> bool {
        LAYOUT_MEDIA_TYPES.contains(&media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ANALYZE_PATH: &str = r"^/documentintelligence/documentModels/prebuilt-layout:analyze";
    const RESULT_PATH: &str = r"^/documentintelligence/documentModels/prebuilt-layout/analyzeResults/op-1";

    fn client(endpoint: &str, max_polls: u32) -> AzureDocumentIntelligence {
        let config = AzureDocumentIntelligenceConfig::new(endpoint, "test-key").with_polling(1, max_polls);
        AzureDocumentIntelligence::new(config).unwrap()
    }

    fn pdf() -> Document {
        Document::new(b"%PDF-1.7 fake".to_vec(), "application/pdf")
    }

    fn operation_location(server: &mockito::Server) -> String {
        format!(
            "{}/documentintelligence/documentModels/prebuilt-layout/analyzeResults/op-1?api-version=2024-11-30",
            server.url()
        )
    }

    #[test]
    fn test_config_default() {
        let config = AzureDocumentIntelligenceConfig::default();
        assert_eq!(config.api_version, "2024-11-30");
        assert_eq!(config.max_polls, 120);
    }

    #[tokio::test]
    async fn test_extracts_markdown_and_pages() {
        let mut server = mockito::Server::new_async().await;
        let submit = server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), "2024-11-30".into()),
                Matcher::UrlEncoded("outputContentFormat".into(), "markdown".into()),
            ]))
            .match_header(SUBSCRIPTION_KEY_HEADER, "test-key")
            .with_status(202)
            .with_header("Operation-Location", &operation_location(&server))
            .create_async()
            .await;
        let poll = server
            .mock("GET", Matcher::Regex(RESULT_PATH.to_string()))
            .match_header(SUBSCRIPTION_KEY_HEADER, "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r##"{"status":"succeeded","analyzeResult":{"content":"# Report\n\nGrowth slowed.","pages":[{"pageNumber":1},{"pageNumber":2}]}}"##,
            )
            .create_async()
            .await;

        let text = client(&server.url(), 3).extract(pdf()).await.unwrap();

        assert_eq!(text.content(), "# Report\n\nGrowth slowed.");
        assert_eq!(text.pages(), 2);
        submit.assert_async().await;
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_blank_result_is_empty_document() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .with_status(202)
            .with_header("Operation-Location", &operation_location(&server))
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(RESULT_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"status":"succeeded","analyzeResult":{"content":"  \n","pages":[{}]}}"#)
            .create_async()
            .await;

        assert!(matches!(
            client(&server.url(), 3).extract(pdf()).await,
            Err(ExtractionError::EmptyDocument)
        ));
    }

    #[tokio::test]
    async fn test_failed_operation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .with_status(202)
            .with_header("Operation-Location", &operation_location(&server))
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex(RESULT_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"status":"failed","error":{"code":"InvalidContent","message":"corrupted"}}"#)
            .create_async()
            .await;

        match client(&server.url(), 3).extract(pdf()).await {
            Err(ExtractionError::AnalysisFailed(detail)) => {
                assert!(detail.contains("InvalidContent"));
                assert!(detail.contains("corrupted"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_polling_budget_exhausted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .with_status(202)
            .with_header("Operation-Location", &operation_location(&server))
            .create_async()
            .await;
        let poll = server
            .mock("GET", Matcher::Regex(RESULT_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"status":"running"}"#)
            .expect(2)
            .create_async()
            .await;

        assert!(matches!(
            client(&server.url(), 2).extract(pdf()).await,
            Err(ExtractionError::PollingExhausted(2))
        ));
        poll.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .with_status(401)
            .with_body("access denied")
            .create_async()
            .await;
        assert!(matches!(
            client(&server.url(), 1).extract(pdf()).await,
            Err(ExtractionError::AuthenticationFailed(_))
        ));

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .with_status(413)
            .with_body("too big")
            .create_async()
            .await;
        assert!(matches!(
            client(&server.url(), 1).extract(pdf()).await,
            Err(ExtractionError::TooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_before_calling_service() {
        let di = client("http://127.0.0.1:9", 1);
        assert!(matches!(
            di.extract(Document::new(b"x".to_vec(), "audio/mpeg")).await,
            Err(ExtractionError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            di.extract(Document::new(Vec::new(), "application/pdf")).await,
            Err(ExtractionError::EmptyDocument)
        ));
    }

    #[tokio::test]
    async fn test_entra_id_bearer_token_without_key() {
        use crate::infrastructure::adapters::identity::{StaticTokenCredential, TokenCredential};
        use std::sync::Arc;

        let mut server = mockito::Server::new_async().await;
        let submit = server
            .mock("POST", Matcher::Regex(ANALYZE_PATH.to_string()))
            .match_header("authorization", "Bearer entra-token")
            .match_header(SUBSCRIPTION_KEY_HEADER, Matcher::Missing)
            .with_status(202)
            .with_header("Operation-Location", &operation_location(&server))
            .create_async()
            .await;
        let poll = server
            .mock("GET", Matcher::Regex(RESULT_PATH.to_string()))
            .match_header("authorization", "Bearer entra-token")
            .with_status(200)
            .with_body(r#"{"status":"succeeded","analyzeResult":{"content":"Body","pages":[{}]}}"#)
            .create_async()
            .await;

        let credential: Arc<dyn TokenCredential> = Arc::new(StaticTokenCredential::new("entra-token"));
        let config = AzureDocumentIntelligenceConfig::new(server.url(), "")
            .with_auth(AzureAuth::from_key_or_credential("", &credential))
            .with_polling(1, 2);
        let text = AzureDocumentIntelligence::new(config)
            .unwrap()
            .extract(pdf())
            .await
            .unwrap();

        assert_eq!(text.content(), "Body");
        submit.assert_async().await;
        poll.assert_async().await;
    }
}
