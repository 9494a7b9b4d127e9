//! HTTP Handlers

mod ping;
mod podcast;
mod websocket;

pub use ping::*;
pub use podcast::*;
pub use websocket::*;
