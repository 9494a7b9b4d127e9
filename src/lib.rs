//! Podcaster - 文档转双人播客
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Podcast Context: 文档、脚本、主持人阵容、音频拼接、费用估算
//! - Token 预算与 SSML 构建
//!
//! 应用层 (application/):
//! - Ports: 文档抽取、脚本生成、语音合成、进度上报
//! - Commands: 生成脚本 / 合成脚本 / 完整流水线
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: Azure Document Intelligence, Azure OpenAI, Azure Speech 及离线实现
//! - HTTP: RESTful API + WebSocket
//! - Events: WebSocket 进度事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
