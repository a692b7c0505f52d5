//! Babel Core - HTTP translation service.
//!
//! This crate provides the service layer for Babel, including:
//! - HTTP server for client communication
//! - Configuration management
//! - Error handling
//!
//! # Example
//!
//! ```rust,no_run
//! use babel_core::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> babel_core::error::Result<()> {
//!     let config = Config::load()?;
//!     server::run(&config).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod service;

pub use config::Config;
pub use error::{BabelError, Result};
pub use service::{ServiceStats, TranslationService};
