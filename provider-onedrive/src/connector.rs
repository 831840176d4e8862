//! Microsoft Graph connector
//!
//! Reads folder listings and single file records from the signed-in user's
//! OneDrive through selective `driveItem` queries.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::CredentialProvider;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{OneDriveError, Result};
use crate::types::{
    ChildSummary, ChildrenResponse, DriveItem, GraphErrorResponse, ItemSummary, RemoteNode,
};

/// Microsoft Graph API base URL
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Fields selected for folder listings
const CHILDREN_SELECT: &str = "name,size,folder,file,@microsoft.graph.downloadUrl";

/// Fields selected for single file lookups
const ITEM_SELECT: &str = "name,size,file,@microsoft.graph.downloadUrl";

/// How much of a paginated folder listing to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Read only the first page; a truncated listing is logged
    #[default]
    FirstPage,
    /// Follow `@odata.nextLink` until the listing is exhausted or a link
    /// repeats
    AllPages,
}

/// Remote tree reader.
///
/// One call answers one question about one path: the children of a folder or
/// the record of a single file. Implementations never retry.
#[async_trait]
pub trait DriveReader: Send + Sync {
    /// Fetch the node at `path`.
    ///
    /// Returns [`RemoteNode::Listing`] when `as_folder` is set and
    /// [`RemoteNode::Item`] otherwise.
    async fn fetch(&self, path: &str, as_folder: bool) -> Result<RemoteNode>;
}

/// OneDrive reader backed by Microsoft Graph.
///
/// # Example
///
/// ```ignore
/// use provider_onedrive::{DriveReader, OneDriveConnector};
///
/// let connector = OneDriveConnector::new(http_client, credentials);
/// let node = connector.fetch("/docs", true).await?;
/// ```
pub struct OneDriveConnector {
    http_client: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
    listing_mode: ListingMode,
    timeout: Option<Duration>,
}

impl OneDriveConnector {
    /// Create a connector against the public Graph endpoint.
    pub fn new(http_client: Arc<dyn HttpClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http_client,
            credentials,
            base_url: GRAPH_API_BASE.to_string(),
            listing_mode: ListingMode::default(),
            timeout: None,
        }
    }

    /// Point the connector at a different Graph base URL (national clouds, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_listing_mode(mut self, listing_mode: ListingMode) -> Self {
        self.listing_mode = listing_mode;
        self
    }

    /// Per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// URL of the children listing of the folder at `path`.
    ///
    /// The path is inserted verbatim and must already be URL-path-safe.
    pub fn children_url(&self, path: &str) -> String {
        format!(
            "{}/me/drive/root:{}:/children?select={}",
            self.base_url, path, CHILDREN_SELECT
        )
    }

    /// URL of the single file record at `path`.
    pub fn item_url(&self, path: &str) -> String {
        format!("{}/me/drive/root:{}?select={}", self.base_url, path, ITEM_SELECT)
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(HttpMethod::Get, url)
            .bearer_token(self.credentials.access_token())
            .header("Accept", "application/json");
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = self.http_client.execute(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(Self::api_error(&response))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| OneDriveError::ParseError(e.to_string()))
    }

    /// Map a non-success response to [`OneDriveError::ApiError`], decoding
    /// the Graph error envelope when there is one.
    fn api_error(response: &HttpResponse) -> OneDriveError {
        match serde_json::from_slice::<GraphErrorResponse>(&response.body) {
            Ok(envelope) => OneDriveError::ApiError {
                status_code: response.status,
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => OneDriveError::ApiError {
                status_code: response.status,
                code: "unknown".to_string(),
                message: String::from_utf8_lossy(&response.body).into_owned(),
            },
        }
    }

    /// List the children of the folder at `path`, in server order.
    #[instrument(skip(self))]
    pub async fn list_children(&self, path: &str) -> Result<Vec<ChildSummary>> {
        let mut page: ChildrenResponse = self.get_json(&self.children_url(path)).await?;
        let mut children: Vec<ChildSummary> = page.value.drain(..).map(Into::into).collect();
        let mut followed = HashSet::new();

        while let Some(next_link) = page.next_link.take() {
            if self.listing_mode == ListingMode::FirstPage {
                warn!(
                    path,
                    read = children.len(),
                    "Folder listing is paginated; only the first page was read"
                );
                break;
            }
            if !followed.insert(next_link.clone()) {
                warn!(
                    path,
                    read = children.len(),
                    "Next page link repeats an earlier page; listing stopped"
                );
                break;
            }

            debug!(path, read = children.len(), "Following next page link");
            page = self.get_json(&next_link).await?;
            children.extend(page.value.drain(..).map(ChildSummary::from));
        }

        debug!(path, count = children.len(), "Listed folder");
        Ok(children)
    }

    /// Fetch the single file record at `path`.
    #[instrument(skip(self))]
    pub async fn get_item(&self, path: &str) -> Result<ItemSummary> {
        let item: DriveItem = self.get_json(&self.item_url(path)).await?;
        Ok(item.into())
    }
}

#[async_trait]
impl DriveReader for OneDriveConnector {
    async fn fetch(&self, path: &str, as_folder: bool) -> Result<RemoteNode> {
        if as_folder {
            self.list_children(path).await.map(RemoteNode::Listing)
        } else {
            self.get_item(path).await.map(RemoteNode::Item)
        }
    }
}
