//! Podcast Context - Value Objects

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::{LineupError, StyleError};

/// 统一 slug 格式：小写，空格和连字符转换为下划线
fn normalize_slug(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// 播客风格（固定的六种节目形态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodcastStyle {
    PlanetMoney,
    Radiolab,
    TheDaily,
    Freakonomics,
    HardcoreHistory,
    Serial,
}

impl PodcastStyle {
    pub const ALL: [PodcastStyle; 6] = [
        Self::PlanetMoney,
        Self::Radiolab,
        Self::TheDaily,
        Self::Freakonomics,
        Self::HardcoreHistory,
        Self::Serial,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::PlanetMoney => "planet_money",
            Self::Radiolab => "radiolab",
            Self::TheDaily => "the_daily",
            Self::Freakonomics => "freakonomics",
            Self::HardcoreHistory => "hardcore_history",
            Self::Serial => "serial",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PlanetMoney => "Planet Money",
            Self::Radiolab => "Radiolab",
            Self::TheDaily => "The Daily",
            Self::Freakonomics => "Freakonomics",
            Self::HardcoreHistory => "Hardcore History",
            Self::Serial => "Serial",
        }
    }

    /// 写入生成提示词的风格描述
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::PlanetMoney => {
                "Explain the economics behind the material with playful curiosity, short scenes and everyday analogies, in the manner of Planet Money."
            }
            Self::Radiolab => {
                "Blend science and storytelling, build a sense of wonder and save a surprising reveal for the middle of the episode, in the manner of Radiolab."
            }
            Self::TheDaily => {
                "Focus on one central story and let one host walk the other through the key facts step by step, in the manner of The Daily."
            }
            Self::Freakonomics => {
                "Question conventional wisdom and dig into hidden incentives and unexpected data, in the manner of Freakonomics Radio."
            }
            Self::HardcoreHistory => {
                "Treat the material as an epic narrative full of vivid detail and historical context, in the manner of Hardcore History."
            }
            Self::Serial => {
                "Unfold the material as an investigation with open questions and cliffhanger moments, in the manner of Serial."
            }
        }
    }
}

impl std::fmt::Display for PodcastStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for PodcastStyle {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = normalize_slug(s);
        Self::ALL
            .iter()
            .copied()
            .find(|style| style.slug() == slug)
            .ok_or_else(|| StyleError::UnknownStyle(s.to_string()))
    }
}

/// 播客语气（固定的六种）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodcastTone {
    Conversational,
    Humorous,
    Serious,
    Enthusiastic,
    Educational,
    Storytelling,
}

impl PodcastTone {
    pub const ALL: [PodcastTone; 6] = [
        Self::Conversational,
        Self::Humorous,
        Self::Serious,
        Self::Enthusiastic,
        Self::Educational,
        Self::Storytelling,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Conversational => "conversational",
            Self::Humorous => "humorous",
            Self::Serious => "serious",
            Self::Enthusiastic => "enthusiastic",
            Self::Educational => "educational",
            Self::Storytelling => "storytelling",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Conversational => "Conversational",
            Self::Humorous => "Humorous",
            Self::Serious => "Serious",
            Self::Enthusiastic => "Enthusiastic",
            Self::Educational => "Educational",
            Self::Storytelling => "Storytelling",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Conversational => {
                "Keep it relaxed and informal, like two friends chatting, with fillers such as \"uhm\" and reactions such as \"wow\"."
            }
            Self::Humorous => "Add light jokes, playful banter and laughter while staying accurate.",
            Self::Serious => "Keep a measured, respectful tone and avoid jokes and filler words.",
            Self::Enthusiastic => "Bring high energy and genuine excitement to every key point.",
            Self::Educational => {
                "Explain concepts step by step, define new terms and recap the key takeaways at the end."
            }
            Self::Storytelling => {
                "Frame the content as a narrative with characters, tension and a resolution."
            }
        }
    }
}

impl std::fmt::Display for PodcastTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for PodcastTone {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = normalize_slug(s);
        Self::ALL
            .iter()
            .copied()
            .find(|tone| tone.slug() == slug)
            .ok_or_else(|| StyleError::UnknownTone(s.to_string()))
    }
}

/// 风格配置 (style, tone)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub style: PodcastStyle,
    pub tone: PodcastTone,
}

impl StyleConfig {
    pub fn new(style: PodcastStyle, tone: PodcastTone) -> Self {
        Self { style, tone }
    }

    /// 从字符串解析（接受 slug 或显示名称）
    pub fn parse(style: &str, tone: &str) -> Result<Self, StyleError> {
        Ok(Self {
            style: style.parse()?,
            tone: tone.parse()?,
        })
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            style: PodcastStyle::PlanetMoney,
            tone: PodcastTone::Conversational,
        }
    }
}

/// 说话人角色键（如 `speaker_1`）
///
/// 不变量: 非空，仅包含 ASCII 字母、数字和下划线
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpeakerRole(String);

impl SpeakerRole {
    pub fn new(role: impl Into<String>) -> Result<Self, LineupError> {
        let role = role.into();
        let valid = !role.is_empty()
            && role.len() <= 64
            && role.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(LineupError::InvalidRole(role));
        }
        Ok(Self(role))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SpeakerRole {
    type Error = LineupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SpeakerRole> for String {
    fn from(role: SpeakerRole) -> Self {
        role.0
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 主持人：角色键 + 名字 + 语音
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub role: SpeakerRole,
    pub name: String,
    pub voice: String,
}

impl Host {
    pub fn new(role: SpeakerRole, name: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            voice: voice.into(),
        }
    }
}

/// 主持人阵容
///
/// 生成的脚本只能使用阵容中的角色，合成时按角色查找语音。
/// 默认两位主持人，但数量由配置决定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostLineup {
    hosts: Vec<Host>,
}

/// 阵容最少主持人数
pub const MIN_HOSTS: usize = 2;

impl HostLineup {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self { hosts }
    }

    /// 验证阵容：至少两位主持人，角色唯一，每个角色都映射到语音
    pub fn validate(&self) -> Result<(), LineupError> {
        if self.hosts.len() < MIN_HOSTS {
            return Err(LineupError::TooFewHosts(self.hosts.len()));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if !seen.insert(host.role.as_str()) {
                return Err(LineupError::DuplicateRole(host.role.to_string()));
            }
            if host.voice.trim().is_empty() {
                return Err(LineupError::MissingVoice(host.role.to_string()));
            }
        }

        Ok(())
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, role: &SpeakerRole) -> Option<&Host> {
        self.hosts.iter().find(|h| &h.role == role)
    }

    pub fn contains(&self, role: &SpeakerRole) -> bool {
        self.host(role).is_some()
    }

    pub fn voice_for(&self, role: &SpeakerRole) -> Option<&str> {
        self.host(role)
            .map(|h| h.voice.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// 按角色键查找（未知键返回 None）
    pub fn find_role(&self, key: &str) -> Option<&SpeakerRole> {
        self.hosts
            .iter()
            .map(|h| &h.role)
            .find(|r| r.as_str() == key)
    }

    pub fn role_keys(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.role.as_str()).collect()
    }
}

impl Default for HostLineup {
    fn default() -> Self {
        Self {
            hosts: vec![
                Host {
                    role: SpeakerRole("speaker_1".to_string()),
                    name: "Andrew".to_string(),
                    voice: "en-US-Andrew:DragonHDLatestNeural".to_string(),
                },
                Host {
                    role: SpeakerRole("speaker_2".to_string()),
                    name: "Ava".to_string(),
                    voice: "en-US-Ava:DragonHDLatestNeural".to_string(),
                },
            ],
        }
    }
}
