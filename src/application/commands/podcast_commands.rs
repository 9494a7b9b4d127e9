//! Podcast Commands - 播客流水线命令

use crate::application::ports::GenerationUsage;
use crate::domain::podcast::{CostBreakdown, Document, PodcastAudio, Script, StyleConfig};

/// 生成脚本命令（抽取 + 生成）
#[derive(Debug, Clone)]
pub struct GenerateScriptCommand {
    pub request_id: String,
    pub document: Document,
    pub style: StyleConfig,
    /// 为空时使用配置中的默认标题
    pub title: Option<String>,
}

/// 生成脚本响应
#[derive(Debug, Clone)]
pub struct GenerateScriptResponse {
    pub request_id: String,
    pub script: Script,
    pub pages: u32,
    pub usage: GenerationUsage,
    /// 输入文本是否因 token 上限被截断
    pub input_truncated: bool,
    pub cost: CostBreakdown,
}

/// 合成脚本命令（仅合成）
#[derive(Debug, Clone)]
pub struct SynthesizeScriptCommand {
    pub request_id: String,
    pub script: Script,
}

/// 合成脚本响应
#[derive(Debug, Clone)]
pub struct SynthesizeScriptResponse {
    pub request_id: String,
    pub audio: PodcastAudio,
    pub cost: CostBreakdown,
}

/// 生成播客命令（完整流水线）
#[derive(Debug, Clone)]
pub struct GeneratePodcastCommand {
    pub request_id: String,
    pub document: Document,
    pub style: StyleConfig,
    pub title: Option<String>,
}

impl From<GeneratePodcastCommand> for GenerateScriptCommand {
    fn from(cmd: GeneratePodcastCommand) -> Self {
        Self {
            request_id: cmd.request_id,
            document: cmd.document,
            style: cmd.style,
            title: cmd.title,
        }
    }
}

/// 生成播客响应
#[derive(Debug, Clone)]
pub struct GeneratePodcastResponse {
    pub request_id: String,
    pub script: Script,
    pub audio: PodcastAudio,
    pub pages: u32,
    pub usage: GenerationUsage,
    pub input_truncated: bool,
    pub cost: CostBreakdown,
}
