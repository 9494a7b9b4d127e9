//! Extractor Router - 按媒体类型分发到具体抽取器

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{DocumentExtractorPort, ExtractionError};
use crate::domain::podcast::{Document, ExtractedText};

/// 按注册顺序选择第一个支持该媒体类型的抽取器
pub struct ExtractorRouter {
    extractors: Vec<Arc<dyn DocumentExtractorPort>>,
}

impl ExtractorRouter {
    pub fn new(extractors: Vec<Arc<dyn DocumentExtractorPort>>) -> Self {
        Self { extractors }
    }

    fn route(&self, media_type: &str) -> Option<&Arc<dyn DocumentExtractorPort>> {
        self.extractors.iter().find(|e| e.supports(media_type))
    }
}

#[async_trait]
impl DocumentExtractorPort for ExtractorRouter {
    async fn extract(&self, document: Document) -> Result<ExtractedText, ExtractionError> {
        let extractor = self
            .route(document.media_type())
            .ok_or_else(|| ExtractionError::UnsupportedFormat(document.media_type().to_string()))?;

        if document.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        tracing::debug!(
            media_type = %document.media_type(),
            file_name = ?document.file_name(),
            bytes = document.len(),
            "Routing document to extractor"
        );
        extractor.extract(document).await
    }

    fn supports(&self, media_type: &str) -> bool {
        self.route(media_type).is_some()
    }
}
