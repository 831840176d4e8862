//! # Authentication Module
//!
//! Credential provider for Microsoft Graph.
//!
//! ## Overview
//!
//! A stored refresh token is exchanged once per run for a short-lived bearer
//! token at the Microsoft identity platform token endpoint. The resulting
//! credentials are read-only for the rest of the run.
//!
//! ## Features
//!
//! - Form-encoded refresh token exchange ([`TokenExchange`])
//! - Token set with expiry bookkeeping and redacted `Debug` ([`OAuthTokens`])
//! - [`CredentialProvider`] seam consumed by the drive connector

pub mod credentials;
pub mod error;
pub mod oauth;
pub mod types;

pub use credentials::{CredentialProvider, SessionCredentials};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, TokenExchange};
pub use types::OAuthTokens;
