//! Error types for download dispatch

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failure to get a usable answer for one `aria2.addUri` call.
///
/// A structured JSON-RPC error from aria2 is not a `DispatchError`; it is
/// reported as [`DispatchOutcome::Rejected`](crate::DispatchOutcome::Rejected).
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request never got a response
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Non-success HTTP status without a JSON-RPC body
    #[error("aria2 endpoint returned HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    /// Success status but the body is not a JSON-RPC response
    #[error("Failed to decode aria2 response: {0}")]
    Decode(String),

    /// The response answers a different request
    #[error("Response id {actual} does not match request id {expected}")]
    IdMismatch { expected: u64, actual: String },

    /// The id counter reached `u64::MAX` before this item
    #[error("No correlation id left after {last}")]
    IdsExhausted { last: u64 },
}

pub type Result<T> = std::result::Result<T, DispatchError>;
