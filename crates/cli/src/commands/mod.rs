//! Command handlers for the pestkb CLI.

pub mod ask;
pub mod chat;
pub mod context;
pub mod health;
pub mod serve;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use context::ContextCommand;
pub use health::HealthCommand;
pub use serve::ServeCommand;
