//! Document Extractor Port - 文档文本抽取抽象
//!
//! 具体实现（Azure Document Intelligence、本地纯文本解码）在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::podcast::{Document, ExtractedText};

/// 抽取错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Document is unreadable: {0}")]
    Unreadable(String),

    #[error("Document is too large: {0}")]
    TooLarge(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by extraction service")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Document analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Analysis did not finish after {0} polls")]
    PollingExhausted(u32),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Document Extractor Port
#[async_trait]
pub trait DocumentExtractorPort: Send + Sync {
    /// 抽取文档文本
    ///
    /// 成功时返回的文本一定非空；空文档或空白输出返回 EmptyDocument
    async fn extract(&self, document: Document) -> Result<ExtractedText, ExtractionError>;

    /// 是否支持该媒体类型
    fn supports(&self, media_type: &str) -> bool;
}
