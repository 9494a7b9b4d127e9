//! LLM Adapter - 脚本生成实现

mod azure_openai;
mod bpe_token_counter;
mod fake_script_generator;
mod prompt;

pub use azure_openai::{AzureOpenAiClient, AzureOpenAiConfig};
pub use bpe_token_counter::BpeTokenCounter;
pub use fake_script_generator::{FakeScriptGenerator, FakeScriptGeneratorConfig};
pub use prompt::{parse_script, script_json_schema, system_prompt, user_message};
