//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(30))?;
//!     // Hand it to the relay service
//! }
//! ```

mod http;

pub use http::ReqwestHttpClient;
