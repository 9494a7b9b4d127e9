//! Document Adapter - 文档抽取实现

mod azure_document_intelligence;
mod plain_text;
mod router;

pub use azure_document_intelligence::{
    AzureDocumentIntelligence, AzureDocumentIntelligenceConfig, LAYOUT_MEDIA_TYPES,
};
pub use plain_text::{PlainTextExtractor, PLAIN_TEXT_MEDIA_TYPES};
pub use router::ExtractorRouter;
