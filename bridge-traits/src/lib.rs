//! # Host Bridge Traits
//!
//! Abstraction seams between the relay core and the host it runs on.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and
//! platform-specific implementations, plus the plain values that travel
//! between the drive provider and the download dispatcher.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations, one attempt per call
//!
//! ## Values
//!
//! - [`Target`](storage::Target) - A configured traversal root
//! - [`DownloadItem`](storage::DownloadItem) - One downloadable file
//! - [`Collection`](storage::Collection) - Ordered, append-only list of items
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Distinguish timeouts and connection failures from other failures
//! - Include error context (e.g., URL, status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared
//! behind `Arc` across async tasks.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{Collection, DownloadItem, Target};
