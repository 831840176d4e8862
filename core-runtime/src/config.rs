//! # Configuration Module
//!
//! Loads and validates the relay configuration document.
//!
//! ## Overview
//!
//! The configuration is a JSON document with the OneDrive application
//! credentials and targets under `application.onedrive`, the download queue
//! endpoint under `download.aria2` and optional HTTP settings under `http`.
//! Loading always validates, so a constructed [`AppConfig`] is safe to hand
//! to the rest of the pipeline.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::from_file("./config.json")?;
//! for target in config.targets() {
//!     println!("{} (folder: {})", target.path, target.is_folder);
//! }
//! ```
//!
//! ## Document Shape
//!
//! ```json
//! {
//!   "application": {
//!     "onedrive": {
//!       "client_id": "...",
//!       "redirect_uri": "http://localhost",
//!       "client_secret": "...",
//!       "refresh_token": "...",
//!       "grant_type": "refresh_token",
//!       "downloadFiles": [{ "path": "/docs", "folder": true }]
//!     }
//!   },
//!   "download": {
//!     "aria2": { "api": "http://localhost:6800/jsonrpc", "dir": "/downloads", "params": {} }
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use bridge_traits::storage::Target;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Microsoft identity platform token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Microsoft Graph API base URL
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// First correlation id handed to the download queue
pub const DEFAULT_START_ID: u64 = 1000;

pub const DEFAULT_GRANT_TYPE: &str = "refresh_token";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fully loaded and validated relay configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OneDrive application credentials and traversal targets
    pub onedrive: OneDriveSettings,

    /// Download queue (aria2 JSON-RPC) settings
    pub aria2: Aria2Settings,

    /// HTTP transport settings
    pub http: HttpSettings,
}

/// OneDrive application settings.
#[derive(Clone, Deserialize)]
pub struct OneDriveSettings {
    pub client_id: String,

    #[serde(default)]
    pub redirect_uri: String,

    #[serde(default)]
    pub client_secret: String,

    pub refresh_token: String,

    #[serde(default = "default_grant_type")]
    pub grant_type: String,

    /// Traversal roots, in collection order
    #[serde(rename = "downloadFiles", default)]
    pub targets: Vec<Target>,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    /// Follow `@odata.nextLink` when listing folders instead of reading
    /// only the first page
    #[serde(default)]
    pub follow_next_link: bool,
}

impl fmt::Debug for OneDriveSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneDriveSettings")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .field("targets", &self.targets)
            .field("token_url", &self.token_url)
            .field("graph_url", &self.graph_url)
            .field("follow_next_link", &self.follow_next_link)
            .finish()
    }
}

/// aria2 JSON-RPC settings.
#[derive(Clone, Deserialize)]
pub struct Aria2Settings {
    /// JSON-RPC endpoint, e.g. `http://localhost:6800/jsonrpc`
    pub api: String,

    /// Base download directory; each item's drive path is appended verbatim
    #[serde(default)]
    pub dir: String,

    /// Options passed through to every `aria2.addUri` call
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Value of aria2's `--rpc-secret`, if the daemon requires one
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default = "default_start_id")]
    pub start_id: u64,
}

impl fmt::Debug for Aria2Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aria2Settings")
            .field("api", &self.api)
            .field("dir", &self.dir)
            .field("params", &self.params)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("start_id", &self.start_id)
            .finish()
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HttpSettings {
    /// Deadline for every HTTP call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_grant_type() -> String {
    DEFAULT_GRANT_TYPE.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_start_id() -> u64 {
    DEFAULT_START_ID
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Deserialize)]
struct ConfigFile {
    application: ApplicationSection,
    download: DownloadSection,
    #[serde(default)]
    http: HttpSettings,
}

#[derive(Deserialize)]
struct ApplicationSection {
    onedrive: OneDriveSettings,
}

#[derive(Deserialize)]
struct DownloadSection {
    aria2: Aria2Settings,
}

impl AppConfig {
    /// Read, parse and validate the configuration file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json_str(&contents)
    }

    /// Parse and validate a configuration document.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(contents)?;

        let config = Self {
            onedrive: file.application.onedrive,
            aria2: file.download.aria2,
            http: file.http,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - OAuth client id and refresh token are present
    /// - Token, Graph and aria2 endpoints are absolute URLs
    /// - Every target has a non-empty path
    /// - The HTTP timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.onedrive.client_id.trim().is_empty() {
            return Err(Error::Config(
                "application.onedrive.client_id cannot be empty".to_string(),
            ));
        }

        if self.onedrive.refresh_token.trim().is_empty() {
            return Err(Error::Config(
                "application.onedrive.refresh_token cannot be empty. \
                 Obtain one through the authorization code flow first."
                    .to_string(),
            ));
        }

        if self.onedrive.grant_type.trim().is_empty() {
            return Err(Error::Config(
                "application.onedrive.grant_type cannot be empty".to_string(),
            ));
        }

        validate_url("application.onedrive.token_url", &self.onedrive.token_url)?;
        validate_url("application.onedrive.graph_url", &self.onedrive.graph_url)?;
        validate_url("download.aria2.api", &self.aria2.api)?;

        if let Some(index) = self
            .onedrive
            .targets
            .iter()
            .position(|target| target.path.trim().is_empty())
        {
            return Err(Error::Config(format!(
                "application.onedrive.downloadFiles[{}].path cannot be empty",
                index
            )));
        }

        if self.http.timeout_secs == 0 {
            return Err(Error::Config(
                "http.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Configured traversal roots, in collection order.
    pub fn targets(&self) -> &[Target] {
        &self.onedrive.targets
    }

    /// Deadline applied to every HTTP call.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| Error::Config(format!("{} is not a valid URL ({}): {}", field, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Config(format!(
            "{} must use http or https, got '{}'",
            field, scheme
        ))),
    }
}
