//! 脚本生成提示词与输出结构
//!
//! 输出结构只定义一次：`ScriptPayload` 负责解析，`script_json_schema`
//! 生成同形状的 strict JSON schema，speaker 枚举取自主持人阵容。

use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::ports::{GenerationError, GenerationRequest};
use crate::domain::podcast::{HostLineup, Script};

const BASE_PROMPT: &str = r#"Create a highly engaging podcast script between {host_count} hosts based on the input text. Use informal language to enhance the human-like quality of the conversation, including expressions like "wow," and pauses such as "uhm."

# Steps

1. **Review the Document(s) and Podcast Title**: Understand the main themes, key points, interesting facts and tone.
2. **Adjust your plan to the requested podcast duration**: The conversation should be engaging and take about {minutes} minutes to read out loud.
3. **Character Development**: Give every host a distinct personality.
4. **Script Structure**: Outline the introduction, main discussion, and conclusion.
5. **Incorporate Informal Language**: Use expressions and fillers to create a natural dialogue flow.
6. **Engage with Humor and Emotion**: Include laughter and emotional responses to make the conversation lively.

# Style

{style}

# Tone

{tone}

# Output Format

- A conversational podcast script in structured JSON.
- Include informal expressions and pauses.
- Clearly mark speaker turns.
- The hosts are: {hosts}.
- In the "speaker" field use only the role key ({keys}), never the host's name.
- Set "config.language" to the BCP-47 code of the language the script is written in, e.g. en-US.

# Notes

- Maintain a balance between informal language and clear communication.
- Ensure the conversation is coherent and follows a logical progression.
- Think step by step, grasp the key points of the document, and explain them in a conversational tone."#;

/// 构造系统提示词
pub fn system_prompt(request: &GenerationRequest) -> String {
    let hosts = request
        .lineup
        .hosts()
        .iter()
        .map(|h| format!("{} (role key \"{}\")", h.name, h.role))
        .collect::<Vec<_>>()
        .join(", ");
    let keys = request.lineup.role_keys().join(", ");

    BASE_PROMPT
        .replace("{host_count}", &request.lineup.hosts().len().to_string())
        .replace("{minutes}", &request.target_minutes.to_string())
        .replace("{style}", request.style.style.prompt())
        .replace("{tone}", request.style.tone.prompt())
        .replace("{hosts}", &hosts)
        .replace("{keys}", &keys)
}

/// 构造用户消息，文档包在 <documents> 标签内
pub fn user_message(title: &str, text: &str) -> String {
    format!(
        "<title>{}</title><documents><document>{}</document></documents>",
        title, text
    )
}

/// 生成 strict JSON schema
pub fn script_json_schema(lineup: &HostLineup) -> Value {
    json!({
        "name": "podcast",
        "strict": true,
        "description": "An AI generated podcast script.",
        "schema": {
            "type": "object",
            "properties": {
                "config": {
                    "type": "object",
                    "properties": {
                        "language": {
                            "type": "string",
                            "description": "Language code + locale (BCP-47), e.g. en-US or es-PA"
                        }
                    },
                    "required": ["language"],
                    "additionalProperties": false
                },
                "script": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "speaker": {
                                "type": "string",
                                "enum": lineup.role_keys(),
                                "description": "Role key of the speaker, never the full name."
                            },
                            "message": { "type": "string" }
                        },
                        "required": ["speaker", "message"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["config", "script"],
            "additionalProperties": false
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptPayload {
    config: PayloadConfig,
    script: Vec<PayloadTurn>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PayloadConfig {
    language: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PayloadTurn {
    speaker: String,
    message: String,
}

/// 解析模型输出并按阵容校验
///
/// 任何结构问题都返回 SchemaViolation，不做纠正
pub fn parse_script(content: &str, lineup: &HostLineup) -> Result<Script, GenerationError> {
    let payload: ScriptPayload = serde_json::from_str(content)
        .map_err(|e| GenerationError::SchemaViolation(e.to_string()))?;

    let turns = payload
        .script
        .into_iter()
        .map(|t| (t.speaker, t.message))
        .collect();

    Ok(Script::new(payload.config.language, turns, lineup)?)
}
