//! Shared Module
//!
//! Types and data structures used across the client core: wire models,
//! error taxonomy, and configuration. Everything here is serialization-ready
//! and free of component-specific state.

/// Application configuration
pub mod config;

/// Shared error types
pub mod error;

/// Wire types for resumes and accounts
pub mod types;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::ApiError;
pub use types::{ApiUser, ResumeData, SavedResume, SavedResumeList};
