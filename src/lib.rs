pub mod chat;
pub mod commands;
pub mod config;
pub mod db;
pub mod llm;

pub use chat::{Assistant, ChatError, ChatReply, NavButton, RequestContext, ToolRegistry};
pub use commands::{create_router, AppState};
pub use config::Config;
pub use db::Database;
