//! pestkb Core Library
//!
//! This crate provides the foundational utilities for the pestkb assistant:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, GenerationConfig};
pub use error::{AppError, AppResult};
