//! Podcast HTTP Handlers
//!
//! - generate: 上传文档 -> 音频
//! - script: 上传文档 -> 脚本（供审阅）
//! - synthesize: 脚本 -> 音频

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{GeneratePodcastCommand, GenerateScriptCommand, SynthesizeScriptCommand};
use crate::domain::podcast::{
    CostBreakdown, Document, PodcastAudio, PodcastStyle, PodcastTone, Script, StyleConfig,
};
use crate::infrastructure::http::dto::{
    ApiResponse, ScriptResponse, StylesResponse, SynthesizeRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-podcast-request-id";
pub const SEGMENTS_HEADER: &str = "x-podcast-segments";
pub const DURATION_HEADER: &str = "x-podcast-duration-ms";
pub const COST_HEADER: &str = "x-podcast-cost-usd";

const MAX_REQUEST_ID_LEN: usize = 128;

/// 上传表单
#[derive(Debug)]
struct UploadForm {
    request_id: String,
    document: Document,
    style: StyleConfig,
    title: Option<String>,
}

/// 按扩展名推断媒体类型
fn guess_media_type(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    let media_type = match ext.as_str() {
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "html" | "htm" => "text/html",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(media_type)
}

fn resolve_request_id(raw: Option<String>) -> Result<String, ApiError> {
    match raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(id) if id.len() > MAX_REQUEST_ID_LEN => Err(ApiError::BadRequest(format!(
            "request_id must be at most {} bytes",
            MAX_REQUEST_ID_LEN
        ))),
        Some(id) => Ok(id),
        None => Ok(Uuid::new_v4().to_string()),
    }
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut document: Option<Document> = None;
    let mut style: Option<String> = None;
    let mut tone: Option<String> = None;
    let mut title: Option<String> = None;
    let mut request_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let declared = field
                    .content_type()
                    .filter(|ct| !ct.starts_with("application/octet-stream"))
                    .map(|ct| ct.to_string());
                let media_type = declared
                    .or_else(|| {
                        file_name
                            .as_deref()
                            .and_then(guess_media_type)
                            .map(|s| s.to_string())
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

                let mut doc = Document::new(bytes.to_vec(), media_type);
                if let Some(name) = file_name {
                    doc = doc.with_file_name(name);
                }
                document = Some(doc);
            }
            "style" => style = Some(read_text_field(field).await?),
            "tone" => tone = Some(read_text_field(field).await?),
            "title" => title = Some(read_text_field(field).await?),
            "request_id" => request_id = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let document = document.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;

    let defaults = StyleConfig::default();
    let style = StyleConfig {
        style: match style.filter(|s| !s.is_empty()) {
            Some(s) => s
                .parse::<PodcastStyle>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => defaults.style,
        },
        tone: match tone.filter(|s| !s.is_empty()) {
            Some(t) => t
                .parse::<PodcastTone>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => defaults.tone,
        },
    };

    Ok(UploadForm {
        request_id: resolve_request_id(request_id)?,
        document,
        style,
        title: title.filter(|t| !t.is_empty()),
    })
}

/// 构建音频响应
fn audio_response(
    request_id: &str,
    audio: PodcastAudio,
    cost: &CostBreakdown,
) -> Result<Response, ApiError> {
    let encoding = audio.encoding();
    let segments = audio.segment_count();
    let duration_ms = audio.duration_ms();
    let data = audio.into_data();

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoding.content_type())
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"podcast.{}\"", encoding.extension()),
        )
        .header(REQUEST_ID_HEADER, request_id)
        .header(SEGMENTS_HEADER, segments)
        .header(COST_HEADER, format!("{:.4}", cost.total()));
    if let Some(ms) = duration_ms {
        builder = builder.header(DURATION_HEADER, ms);
    }

    builder
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(format!("Failed to build audio response: {}", e)))
}

/// 可选的风格、语气与主持人阵容
pub async fn podcast_styles(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<StylesResponse>> {
    Json(ApiResponse::success(StylesResponse::new(
        state.lineup.hosts(),
    )))
}

/// 完整流水线：文档 -> 音频
pub async fn generate_podcast(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_upload(multipart).await?;

    tracing::info!(
        request_id = %form.request_id,
        media_type = %form.document.media_type(),
        bytes = form.document.len(),
        style = %form.style.style.slug(),
        tone = %form.style.tone.slug(),
        "Podcast generation requested"
    );

    let result = state
        .generate_podcast_handler
        .handle(GeneratePodcastCommand {
            request_id: form.request_id,
            document: form.document,
            style: form.style,
            title: form.title,
        })
        .await?;

    audio_response(&result.request_id, result.audio, &result.cost)
}

/// 抽取 + 生成：返回脚本供审阅
pub async fn generate_script(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ScriptResponse>>, ApiError> {
    let form = read_upload(multipart).await?;

    tracing::info!(
        request_id = %form.request_id,
        media_type = %form.document.media_type(),
        bytes = form.document.len(),
        "Script generation requested"
    );

    let result = state
        .generate_script_handler
        .handle(GenerateScriptCommand {
            request_id: form.request_id,
            document: form.document,
            style: form.style,
            title: form.title,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// 合成已审阅的脚本
pub async fn synthesize_script(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    let request_id = resolve_request_id(req.request_id)?;
    let (language, turns) = req.script.into_parts();
    let script = Script::new(language, turns, &state.lineup)
        .map_err(|e| ApiError::BadRequest(format!("Invalid script: {}", e)))?;

    tracing::info!(
        request_id = %request_id,
        turns = script.len(),
        characters = script.character_count(),
        "Script synthesis requested"
    );

    let result = state
        .synthesize_script_handler
        .handle(SynthesizeScriptCommand { request_id, script })
        .await?;

    audio_response(&result.request_id, result.audio, &result.cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_media_type() {
        assert_eq!(guess_media_type("notes.MD"), Some("text/markdown"));
        assert_eq!(guess_media_type("paper.pdf"), Some("application/pdf"));
        assert_eq!(guess_media_type("archive.zip"), None);
        assert_eq!(guess_media_type("README"), None);
    }

    #[test]
    fn test_resolve_request_id() {
        assert_eq!(resolve_request_id(Some(" abc ".into())).unwrap(), "abc");
        let generated = resolve_request_id(Some("   ".into())).unwrap();
        assert!(Uuid::parse_str(&generated).is_ok());
        assert!(resolve_request_id(Some("x".repeat(MAX_REQUEST_ID_LEN + 1))).is_err());
    }
}
