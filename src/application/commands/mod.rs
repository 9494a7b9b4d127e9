//! 应用层 - 命令
//!
//! 播客流水线的三个用例：生成脚本、合成脚本、完整生成

mod podcast_commands;

pub mod handlers;

pub use podcast_commands::*;
