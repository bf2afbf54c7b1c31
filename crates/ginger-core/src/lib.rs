//! ginger-core: transcript analysis for the Ginger voice companion
//!
//! This crate provides the analytical core behind Ginger's coaching tools:
//! classifying conflict patterns and communication styles in message
//! transcripts, and scoring recorded role-play sessions to extract
//! highlight moments and package them for video rendering.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod highlights;
pub mod lexicon;
pub mod models;
pub mod session;
pub mod video;

pub use analyzer::ConflictAnalyzer;
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use lexicon::Lexicon;
pub use session::SessionRegistry;

/// Application name used for config directories and paths.
pub const APP_NAME: &str = "ginger";

/// Returns the environment variable prefix for this application.
pub fn env_prefix() -> String {
    "GINGER".to_string()
}
