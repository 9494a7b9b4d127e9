//! Podcaster - 文档转双人播客服务
//!
//! - Domain: podcast/ (脚本、阵容、音频拼接、费用)
//! - Application: commands, ports
//! - Infrastructure: http, adapters, events

use std::sync::Arc;

use podcaster::application::PipelineSettings;
use podcaster::config::{load_config, print_config, AppConfig};
use podcaster::infrastructure::events::EventPublisher;
use podcaster::infrastructure::http::{AppState, HttpServer};
use podcaster::infrastructure::adapters::BpeTokenCounter;
use podcaster::infrastructure::{
    build_credential, build_document_extractor, build_script_generator, build_speech_synthesizer,
};

/// 初始化日志（RUST_LOG 优先于配置）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},podcaster={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > Azure 标准环境变量 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Podcaster - 文档转播客服务");
    print_config(&config);

    // 创建适配器（未配置 key 的 Azure 服务共用 Entra ID 凭据）
    let credential = build_credential(&config.identity)?;
    let extractor = build_document_extractor(&config.document, &credential)?;
    let generator = build_script_generator(&config.llm, &credential)?;
    let synthesizer = build_speech_synthesizer(&config.speech, &credential)?;
    let token_counter = BpeTokenCounter::from_encoding(config.llm.token_encoding)?;

    if !synthesizer.health_check().await {
        tracing::warn!("Speech synthesizer is not reachable at startup");
    }

    // 创建事件发布器
    let event_publisher = Arc::new(EventPublisher::new());

    let settings = PipelineSettings {
        lineup: config.podcast.hosts.clone(),
        default_title: config.podcast.default_title.clone(),
        target_minutes: config.podcast.target_minutes,
        max_input_tokens: config.llm.max_input_tokens,
    };

    let state = AppState::new(
        extractor,
        generator,
        synthesizer,
        Arc::new(token_counter),
        event_publisher,
        settings,
        config.speech.max_concurrent,
    );

    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
