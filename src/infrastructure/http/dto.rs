//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{GenerateScriptResponse, GenerationUsage};
use crate::domain::podcast::{CostBreakdown, Host, PodcastStyle, PodcastTone, Script};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Style DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OptionResponse {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HostResponse {
    pub role: String,
    pub name: String,
    pub voice: String,
}

impl From<&Host> for HostResponse {
    fn from(host: &Host) -> Self {
        Self {
            role: host.role.to_string(),
            name: host.name.clone(),
            voice: host.voice.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StylesResponse {
    pub styles: Vec<OptionResponse>,
    pub tones: Vec<OptionResponse>,
    pub hosts: Vec<HostResponse>,
}

impl StylesResponse {
    pub fn new(hosts: &[Host]) -> Self {
        Self {
            styles: PodcastStyle::ALL
                .iter()
                .map(|s| OptionResponse {
                    id: s.slug(),
                    name: s.display_name(),
                })
                .collect(),
            tones: PodcastTone::ALL
                .iter()
                .map(|t| OptionResponse {
                    id: t.slug(),
                    name: t.display_name(),
                })
                .collect(),
            hosts: hosts.iter().map(HostResponse::from).collect(),
        }
    }
}

// ============================================================================
// Script DTOs
// ============================================================================

/// 单轮对白
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDto {
    pub speaker: String,
    pub message: String,
}

/// 脚本（与生成接口返回的结构一致，可直接回传给合成接口）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDto {
    pub language: String,
    pub script: Vec<TurnDto>,
}

impl From<&Script> for ScriptDto {
    fn from(script: &Script) -> Self {
        Self {
            language: script.language().to_string(),
            script: script
                .turns()
                .iter()
                .map(|t| TurnDto {
                    speaker: t.speaker().to_string(),
                    message: t.message().to_string(),
                })
                .collect(),
        }
    }
}

impl ScriptDto {
    pub fn into_parts(self) -> (String, Vec<(String, String)>) {
        let turns = self
            .script
            .into_iter()
            .map(|t| (t.speaker, t.message))
            .collect();
        (self.language, turns)
    }
}

#[derive(Debug, Serialize)]
pub struct CostResponse {
    pub document_usd: f64,
    pub generation_usd: f64,
    pub speech_usd: f64,
    pub total_usd: f64,
}

impl From<CostBreakdown> for CostResponse {
    fn from(cost: CostBreakdown) -> Self {
        Self {
            document_usd: cost.document_usd,
            generation_usd: cost.generation_usd,
            speech_usd: cost.speech_usd,
            total_usd: cost.total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScriptResponse {
    pub request_id: String,
    #[serde(flatten)]
    pub script: ScriptDto,
    pub pages: u32,
    pub usage: GenerationUsage,
    pub input_truncated: bool,
    pub cost: CostResponse,
    pub created_at: String,
}

impl From<GenerateScriptResponse> for ScriptResponse {
    fn from(resp: GenerateScriptResponse) -> Self {
        Self {
            request_id: resp.request_id,
            script: ScriptDto::from(&resp.script),
            pages: resp.pages,
            usage: resp.usage,
            input_truncated: resp.input_truncated,
            cost: resp.cost.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// 合成请求
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub script: ScriptDto,
}
