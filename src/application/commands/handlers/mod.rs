//! Command Handlers 实现

mod narrator;
mod podcast_handlers;

pub use narrator::ScriptNarrator;
pub use podcast_handlers::*;
