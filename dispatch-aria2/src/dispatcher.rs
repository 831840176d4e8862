//! Download dispatcher
//!
//! Hands a finished [`Collection`] to aria2, one `aria2.addUri` call per
//! item, strictly in collection order. Each item gets its own correlation id;
//! the counter advances after every item whose request was built, whatever
//! the response says. Failures are reported and never stop the run. Items
//! left over once the counter passes `u64::MAX` are failed without a call.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{Collection, DownloadItem};
use core_runtime::config::Aria2Settings;
use core_runtime::logging::strip_query;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{DispatchError, Result};
use crate::rpc::{RpcRequest, RpcResponse};

/// Result of dispatching one item.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// aria2 accepted the download
    Queued {
        id: u64,
        gid: Option<String>,
        name: String,
        size: u64,
    },
    /// aria2 answered with a JSON-RPC error
    Rejected {
        id: u64,
        name: String,
        code: i64,
        message: String,
    },
    /// No usable answer
    Failed {
        id: u64,
        name: String,
        error: DispatchError,
    },
}

impl DispatchOutcome {
    pub fn id(&self) -> u64 {
        match self {
            DispatchOutcome::Queued { id, .. }
            | DispatchOutcome::Rejected { id, .. }
            | DispatchOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, DispatchOutcome::Queued { .. })
    }
}

/// Per-item outcomes of one dispatch run, in dispatch order.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    outcomes: Vec<DispatchOutcome>,
}

impl DispatchSummary {
    pub fn outcomes(&self) -> &[DispatchOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.count(|o| matches!(o, DispatchOutcome::Queued { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, DispatchOutcome::Rejected { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DispatchOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&DispatchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Sequential `aria2.addUri` client.
///
/// # Example
///
/// ```ignore
/// use dispatch_aria2::Aria2Dispatcher;
///
/// let dispatcher = Aria2Dispatcher::new(http_client, config.aria2.clone());
/// let summary = dispatcher.dispatch(collection).await;
/// println!("{} queued", summary.queued());
/// ```
pub struct Aria2Dispatcher {
    http_client: Arc<dyn HttpClient>,
    settings: Aria2Settings,
    timeout: Option<Duration>,
}

impl Aria2Dispatcher {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: Aria2Settings) -> Self {
        Self {
            http_client,
            settings,
            timeout: None,
        }
    }

    /// Per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the `aria2.addUri` call for `item`.
    ///
    /// The configured passthrough options are copied into every call; `dir`
    /// is always the configured base directory followed by the item's path,
    /// overriding any `dir` among the passthrough options.
    pub fn build_request(&self, id: u64, item: &DownloadItem) -> RpcRequest {
        let mut options = self.settings.params.clone();
        options.insert(
            "dir".to_string(),
            Value::String(format!("{}{}", self.settings.dir, item.path)),
        );

        RpcRequest::add_uri(
            id,
            &item.download_url,
            options,
            self.settings.secret.as_deref(),
        )
    }

    /// Submit every item of `collection`, in order.
    #[instrument(skip_all, fields(items = collection.len()))]
    pub async fn dispatch(&self, collection: Collection) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let mut next_id = Some(self.settings.start_id);

        for item in collection {
            let Some(id) = next_id else {
                warn!(name = %item.name, "Correlation ids exhausted, item not sent");
                summary.outcomes.push(DispatchOutcome::Failed {
                    id: u64::MAX,
                    name: item.name,
                    error: DispatchError::IdsExhausted { last: u64::MAX },
                });
                continue;
            };

            let request = match self.http_request(id, &item) {
                Ok(request) => request,
                Err(error) => {
                    warn!(name = %item.name, error = %error, "Could not build request");
                    summary.outcomes.push(DispatchOutcome::Failed {
                        id,
                        name: item.name,
                        error,
                    });
                    continue;
                }
            };

            let outcome = match self.send(id, request).await {
                Ok(response) => Self::classify(id, item, response),
                Err(error) => {
                    warn!(id, name = %item.name, error = %error, "Dispatch failed");
                    DispatchOutcome::Failed {
                        id,
                        name: item.name,
                        error,
                    }
                }
            };
            summary.outcomes.push(outcome);
            next_id = id.checked_add(1);
        }

        info!(
            queued = summary.queued(),
            rejected = summary.rejected(),
            failed = summary.failed(),
            "Dispatch complete"
        );
        summary
    }

    fn http_request(&self, id: u64, item: &DownloadItem) -> Result<HttpRequest> {
        let rpc = self.build_request(id, item);
        let mut request = HttpRequest::new(HttpMethod::Post, &self.settings.api).json(&rpc)?;
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        debug!(
            id,
            name = %item.name,
            url = strip_query(&item.download_url),
            "Submitting download"
        );
        Ok(request)
    }

    async fn send(&self, id: u64, request: HttpRequest) -> Result<RpcResponse> {
        let response = self.http_client.execute(request).await?;
        let decoded = Self::decode(&response)?;

        // aria2 reports RPC errors with an error status, so a structured
        // error is accepted whatever the status was.
        if decoded.error.is_none() && !decoded.answers(id) {
            return Err(DispatchError::IdMismatch {
                expected: id,
                actual: decoded.id_display(),
            });
        }
        Ok(decoded)
    }

    fn decode(response: &HttpResponse) -> Result<RpcResponse> {
        match serde_json::from_slice::<RpcResponse>(&response.body) {
            Ok(decoded) => Ok(decoded),
            Err(_) if !response.is_success() => Err(DispatchError::Transport {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
            Err(e) => Err(DispatchError::Decode(e.to_string())),
        }
    }

    fn classify(id: u64, item: DownloadItem, response: RpcResponse) -> DispatchOutcome {
        match response.error {
            Some(error) => {
                warn!(
                    id,
                    name = %item.name,
                    code = error.code,
                    "aria2 rejected download: {}",
                    error.message
                );
                DispatchOutcome::Rejected {
                    id,
                    name: item.name,
                    code: error.code,
                    message: error.message,
                }
            }
            None => {
                let gid = response.gid();
                info!(id, name = %item.name, size = item.size, gid = ?gid, "Queued download");
                DispatchOutcome::Queued {
                    id,
                    gid,
                    name: item.name,
                    size: item.size,
                }
            }
        }
    }
}
