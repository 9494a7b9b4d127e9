//! Plain Text Extractor - 本地解码纯文本 / Markdown
//!
//! 不调用任何远程服务，页数记为 0

use async_trait::async_trait;

use crate::application::ports::{DocumentExtractorPort, ExtractionError};
use crate::domain::podcast::{Document, ExtractedText};

/// 本地解码支持的媒体类型
pub const PLAIN_TEXT_MEDIA_TYPES: &[&str] = &["text/plain", "text/markdown", "text/x-markdown"];

const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractorPort for PlainTextExtractor {
    async fn extract(&self, document: Document) -> Result<ExtractedText, ExtractionError> {
        if !self.supports(document.media_type()) {
            return Err(ExtractionError::UnsupportedFormat(
                document.media_type().to_string(),
            ));
        }

        let mut bytes = document.into_bytes();
        if bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }
        if bytes.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let text = String::from_utf8(bytes)
            .map_err(|e| ExtractionError::Unreadable(format!("Invalid UTF-8: {}", e)))?;

        tracing::debug!(chars = text.chars().count(), "Decoded plain text document");

        ExtractedText::new(text, 0).ok_or(ExtractionError::EmptyDocument)
    }

    fn supports(&self, media_type: &str) -> bool {
        PLAIN_TEXT_MEDIA_TYPES.contains(&media_type)
    }
}
