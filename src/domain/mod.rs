//! Domain Layer - 领域层
//!
//! 包含:
//! - Podcast Context: 文档 -> 脚本 -> 音频
//! - token 预算与 SSML 构造等共享工具

pub mod podcast;

mod ssml;
mod token_budget;

pub use ssml::{build_turn_ssml, escape_ssml};
pub use token_budget::{apply_token_budget, BudgetedText, TokenCounter};

#[cfg(test)]
pub(crate) use token_budget::WhitespaceTokenCounter;
