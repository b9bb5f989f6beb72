//! cvforge - Client Core
//!
//! Client-side session and synchronization core for a web-based resume
//! builder: the pieces between the editing surface and the server that have
//! to be right for everything else to feel instant.
//!
//! # Overview
//!
//! This library provides:
//! - A single HTTP chokepoint with cookie-session auth, CSRF header
//!   injection, timeouts, and typed errors
//! - The session state machine (anonymous / guest / unverified / verified)
//!   with guest-to-permanent upgrade and transport-driven forced logout
//! - The live-preview pipeline: debounced, cancellable, race-free PDF
//!   renders of the in-progress document
//! - The saved-resume store: auth-gated CRUD with quota-limit routing
//!
//! # Module Structure
//!
//! - **`shared`** - Configuration, error taxonomy, and wire types
//! - **`client`** - The HTTP client every other module goes through
//! - **`session`** - Identity lifecycle and its subscription surface
//! - **`preview`** - The live-preview synchronizer and frame lifecycle
//! - **`resumes`** - Saved-resume persistence orchestration
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cvforge::client::ApiClient;
//! use cvforge::preview::PreviewSynchronizer;
//! use cvforge::resumes::ResumeStore;
//! use cvforge::session::SessionManager;
//! use cvforge::shared::config::AppConfig;
//! use cvforge::shared::types::ResumeData;
//!
//! # async fn example() -> Result<(), cvforge::shared::error::ApiError> {
//! let config = AppConfig::default();
//! let client = Arc::new(ApiClient::new(&config)?);
//!
//! let session = SessionManager::new(Arc::clone(&client));
//! session.resolve(None).await;
//!
//! let preview = PreviewSynchronizer::with_config(Arc::clone(&client), &config);
//! let mut document = ResumeData::empty();
//! document.personal.name = "Ada Lovelace".to_string();
//! preview.update(&document, "en");
//!
//! let mut resumes = ResumeStore::new(client, session.subscribe());
//! resumes.save("My CV", &document).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Everything runs on tokio. The session state has one writer and many
//! watch-channel readers; preview renders overlap freely but only the
//! last-started one may install its result.

/// Shared configuration, errors, and wire types
pub mod shared;

/// HTTP client chokepoint
pub mod client;

/// Session state machine
pub mod session;

/// Live preview synchronizer
pub mod preview;

/// Saved-resume persistence
pub mod resumes;

pub use client::ApiClient;
pub use preview::{PreviewStatus, PreviewSynchronizer};
pub use resumes::{ResumeStore, SaveOutcome};
pub use session::{Identity, SessionManager, SessionState};
pub use shared::{ApiError, AppConfig, ResumeData};
