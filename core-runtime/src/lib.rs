//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the relay:
//! - Configuration loading and validation
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! Other crates receive an explicit [`AppConfig`](config::AppConfig) value
//! built here at startup; nothing in the workspace reads process-wide
//! settings.

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{Error, Result};
