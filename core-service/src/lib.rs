//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided HTTP bridge and the loaded
//! configuration into the relay pipeline: authenticate, collect the OneDrive
//! tree, then queue every item on aria2. Command-line hosts typically enable
//! the `desktop-shims` feature (which depends on `bridge-desktop`) and call
//! [`bootstrap_desktop`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, storage::Collection};
use core_auth::{CredentialProvider, OAuthConfig, SessionCredentials};
use core_runtime::config::AppConfig;
use dispatch_aria2::{Aria2Dispatcher, DispatchSummary};
use provider_onedrive::{ListingMode, OneDriveConnector, TreeCollector};
use tracing::{info, instrument};

#[cfg(feature = "desktop-shims")]
use bridge_desktop::ReqwestHttpClient;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

/// What one full run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Items found in the remote tree
    pub collected: usize,
    /// Combined size of the collected items, in bytes
    pub total_bytes: u64,
    /// Per-item dispatch outcomes
    pub dispatch: DispatchSummary,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct RelayService {
    deps: Arc<CoreDependencies>,
    config: Arc<AppConfig>,
}

impl RelayService {
    /// Create a new service from the provided dependencies and configuration.
    pub fn new(deps: CoreDependencies, config: AppConfig) -> Self {
        Self {
            deps: Arc::new(deps),
            config: Arc::new(config),
        }
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Exchange the configured refresh token for a bearer token.
    ///
    /// # Errors
    ///
    /// [`CoreError::Auth`] on any failure; the run cannot continue without
    /// credentials.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<SessionCredentials> {
        let onedrive = &self.config.onedrive;
        let oauth = OAuthConfig {
            client_id: onedrive.client_id.clone(),
            client_secret: onedrive.client_secret.clone(),
            redirect_uri: onedrive.redirect_uri.clone(),
            grant_type: onedrive.grant_type.clone(),
            token_url: onedrive.token_url.clone(),
        };

        let credentials = SessionCredentials::authenticate(
            oauth,
            &onedrive.refresh_token,
            Arc::clone(&self.deps.http_client),
        )
        .await?;
        Ok(credentials)
    }

    /// Walk every configured target and flatten it into a [`Collection`].
    pub async fn collect(&self, credentials: Arc<dyn CredentialProvider>) -> Collection {
        let listing_mode = if self.config.onedrive.follow_next_link {
            ListingMode::AllPages
        } else {
            ListingMode::FirstPage
        };

        let connector = OneDriveConnector::new(Arc::clone(&self.deps.http_client), credentials)
            .with_base_url(self.config.onedrive.graph_url.as_str())
            .with_listing_mode(listing_mode)
            .with_timeout(self.config.http_timeout());

        TreeCollector::new(Arc::new(connector))
            .collect(self.config.targets())
            .await
    }

    /// Queue every item of `collection` on aria2.
    pub async fn dispatch(&self, collection: Collection) -> DispatchSummary {
        Aria2Dispatcher::new(
            Arc::clone(&self.deps.http_client),
            self.config.aria2.clone(),
        )
        .with_timeout(self.config.http_timeout())
        .dispatch(collection)
        .await
    }

    /// Authenticate and collect, without dispatching anything.
    pub async fn plan(&self) -> Result<Collection> {
        let credentials = self.authenticate().await?;
        Ok(self.collect(Arc::new(credentials)).await)
    }

    /// Authenticate, collect and dispatch.
    ///
    /// Only authentication failure is an error. Failed targets, folders and
    /// items are logged and reflected in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let collection = self.plan().await?;
        let collected = collection.len();
        let total_bytes = collection.total_size();

        let dispatch = self.dispatch(collection).await;
        info!(
            collected,
            queued = dispatch.queued(),
            rejected = dispatch.rejected(),
            failed = dispatch.failed(),
            "Run finished"
        );

        Ok(RunReport {
            collected,
            total_bytes,
            dispatch,
        })
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Builds a `reqwest` client honouring the configured HTTP timeout.
///
/// ```ignore
/// use core_runtime::config::AppConfig;
/// use core_service::bootstrap_desktop;
///
/// let config = AppConfig::from_file("./config.json")?;
/// let relay = bootstrap_desktop(config)?;
/// let report = relay.run().await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: AppConfig) -> Result<RelayService> {
    let http_client = ReqwestHttpClient::with_timeout(config.http_timeout())
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    Ok(RelayService::new(
        CoreDependencies::new(Arc::new(http_client)),
        config,
    ))
}
