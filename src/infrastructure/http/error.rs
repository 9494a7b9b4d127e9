//! HTTP Error Handling
//!
//! 业务错误统一返回 HTTP 200 + errno，流水线错误附带失败阶段

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{PipelineError, PipelineStage};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>, stage: Option<PipelineStage>) -> Self {
        Self {
            errno,
            error: error.into(),
            stage,
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const UNPROCESSABLE: i32 = 422;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    /// 流水线阶段失败
    Pipeline(PipelineError),
}

impl ApiError {
    /// (errno, 阶段)
    fn classify(&self) -> (i32, Option<PipelineStage>) {
        match self {
            ApiError::BadRequest(_) => (errno::BAD_REQUEST, None),
            ApiError::Internal(_) => (errno::INTERNAL_ERROR, None),
            ApiError::Pipeline(e) => {
                let code = if e.is_invalid_input() {
                    errno::BAD_REQUEST
                } else if e.is_rate_limited() {
                    errno::SERVICE_UNAVAILABLE
                } else if e.stage() == PipelineStage::Configuration {
                    errno::INTERNAL_ERROR
                } else {
                    errno::UNPROCESSABLE
                };
                (code, Some(e.stage()))
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg.clone(),
            ApiError::Pipeline(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, stage) = self.classify();
        let message = self.message();

        if code >= errno::INTERNAL_ERROR {
            tracing::error!(errno = code, stage = ?stage, error = %message, "Request failed");
        } else {
            tracing::warn!(errno = code, stage = ?stage, error = %message, "Request rejected");
        }

        (
            StatusCode::OK,
            Json(ErrorResponse::new(code, message, stage)),
        )
            .into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ConfigurationError, ExtractionError, GenerationError, SynthesisError};
    use crate::domain::podcast::LineupError;

    fn classify(e: PipelineError) -> (i32, Option<PipelineStage>) {
        ApiError::from(e).classify()
    }

    #[test]
    fn test_pipeline_error_codes() {
        assert_eq!(
            classify(ExtractionError::UnsupportedFormat("image/gif".into()).into()),
            (errno::BAD_REQUEST, Some(PipelineStage::Extraction))
        );
        assert_eq!(
            classify(ExtractionError::EmptyDocument.into()),
            (errno::UNPROCESSABLE, Some(PipelineStage::Extraction))
        );
        assert_eq!(
            classify(GenerationError::SchemaViolation("missing speaker".into()).into()),
            (errno::UNPROCESSABLE, Some(PipelineStage::Generation))
        );
        assert_eq!(
            classify(GenerationError::RateLimited.into()),
            (errno::SERVICE_UNAVAILABLE, Some(PipelineStage::Generation))
        );
        assert_eq!(
            classify(
                SynthesisError::TurnFailed {
                    index: 3,
                    source: Box::new(SynthesisError::Timeout),
                }
                .into()
            ),
            (errno::UNPROCESSABLE, Some(PipelineStage::Synthesis))
        );
        assert_eq!(
            classify(ConfigurationError::from(LineupError::TooFewHosts(1)).into()),
            (errno::INTERNAL_ERROR, Some(PipelineStage::Configuration))
        );
    }

    #[tokio::test]
    async fn test_error_body_carries_stage() {
        let response =
            ApiError::from(PipelineError::from(ExtractionError::EmptyDocument)).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errno"], 422);
        assert_eq!(json["stage"], "extraction");
        assert!(json["data"].is_null());
    }
}
