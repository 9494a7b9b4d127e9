//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                  GET   健康检查
//! - /api/podcast/styles        GET   风格、语气与主持人阵容
//! - /api/podcast/generate      POST  上传文档，返回音频
//! - /api/podcast/script        POST  上传文档，返回脚本
//! - /api/podcast/synthesize    POST  提交脚本，返回音频
//! - /ws/events                 WS    进度事件（可选 ?request_id=）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/podcast", podcast_routes())
}

/// Podcast 路由
fn podcast_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/styles", get(handlers::podcast_styles))
        .route("/generate", post(handlers::generate_podcast))
        .route("/script", post(handlers::generate_script))
        .route("/synthesize", post(handlers::synthesize_script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::PipelineSettings;
    use crate::domain::podcast::HostLineup;
    use crate::domain::WhitespaceTokenCounter;
    use crate::infrastructure::adapters::{
        FakeScriptGenerator, FakeSpeechSynthesizer, PlainTextExtractor,
    };
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::build_router;
    use crate::infrastructure::http::handlers::{
        COST_HEADER, DURATION_HEADER, REQUEST_ID_HEADER, SEGMENTS_HEADER,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tower::util::ServiceExt;

    const BOUNDARY: &str = "podcaster-test-boundary";
    const ARTICLE: &str = "Interest rates went up. Mortgages got pricier. Savers cheered.";

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(PlainTextExtractor::new()),
            Arc::new(FakeScriptGenerator::with_defaults()),
            Arc::new(FakeSpeechSynthesizer::with_defaults()),
            Arc::new(WhitespaceTokenCounter),
            Arc::new(EventPublisher::new()),
            PipelineSettings {
                lineup: HostLineup::default(),
                default_title: "AI in Action".to_string(),
                target_minutes: 5,
                max_input_tokens: 1000,
            },
            4,
        );
        build_router(Arc::new(state), 1024 * 1024)
    }

    fn multipart_body(
        file_name: &str,
        content_type: &str,
        content: &[u8],
        fields: &[(&str, &str)],
    ) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> Response {
        app().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let response = send(Request::get("/api/ping").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_styles() {
        let response =
            send(Request::get("/api/podcast/styles").body(Body::empty()).unwrap()).await;
        let json = json_body(response).await;

        assert_eq!(json["data"]["styles"].as_array().unwrap().len(), 6);
        assert_eq!(json["data"]["tones"].as_array().unwrap().len(), 6);
        assert_eq!(json["data"]["hosts"][0]["role"], "speaker_1");
    }

    #[tokio::test]
    async fn test_generate_returns_audio_with_headers() {
        let body = multipart_body(
            "rates.txt",
            "text/plain",
            ARTICLE.as_bytes(),
            &[("style", "planet_money"), ("tone", "Conversational"), ("request_id", "req-42")],
        );
        let response = send(upload("/api/podcast/generate", body)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(headers[REQUEST_ID_HEADER], "req-42");
        assert_eq!(headers[SEGMENTS_HEADER], "12");
        assert!(headers.contains_key(DURATION_HEADER));
        assert!(headers.contains_key(COST_HEADER));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_script_then_synthesize() {
        let body = multipart_body(
            "rates.md",
            "application/octet-stream",
            ARTICLE.as_bytes(),
            &[],
        );
        let response = send(upload("/api/podcast/script", body)).await;
        let json = json_body(response).await;

        assert_eq!(json["errno"], 0);
        let data = &json["data"];
        assert_eq!(data["language"], "en-US");
        assert_eq!(data["script"].as_array().unwrap().len(), 12);
        assert_eq!(data["input_truncated"], false);

        let synth = serde_json::json!({
            "request_id": "review-1",
            "language": data["language"],
            "script": data["script"],
        });
        let response = send(
            Request::post("/api/podcast/synthesize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(synth.to_string()))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "review-1");
        assert_eq!(response.headers()[SEGMENTS_HEADER], "12");
    }

    #[tokio::test]
    async fn test_synthesize_rejects_unknown_speaker() {
        let synth = serde_json::json!({
            "language": "en-US",
            "script": [{"speaker": "narrator", "message": "Hello"}],
        });
        let response = send(
            Request::post("/api/podcast/synthesize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(synth.to_string()))
                .unwrap(),
        )
        .await;

        let json = json_body(response).await;
        assert_eq!(json["errno"], 400);
    }

    #[tokio::test]
    async fn test_unsupported_format_is_bad_request() {
        let body = multipart_body("scan.pdf", "application/pdf", b"%PDF-1.7", &[]);
        let json = json_body(send(upload("/api/podcast/generate", body)).await).await;

        assert_eq!(json["errno"], 400);
        assert_eq!(json["stage"], "extraction");
    }

    #[tokio::test]
    async fn test_empty_document_is_stage_failure() {
        let body = multipart_body("empty.txt", "text/plain", b"   \n", &[]);
        let json = json_body(send(upload("/api/podcast/script", body)).await).await;

        assert_eq!(json["errno"], 422);
        assert_eq!(json["stage"], "extraction");
    }

    #[tokio::test]
    async fn test_unknown_style_is_bad_request() {
        let body = multipart_body(
            "rates.txt",
            "text/plain",
            ARTICLE.as_bytes(),
            &[("style", "joe_rogan")],
        );
        let json = json_body(send(upload("/api/podcast/generate", body)).await).await;

        assert_eq!(json["errno"], 400);
        assert!(json.get("stage").is_none());
    }
}
