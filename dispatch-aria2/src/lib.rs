//! # aria2 Dispatch
//!
//! Queues downloads on an aria2 daemon over its JSON-RPC interface.
//!
//! Items are submitted one at a time with `aria2.addUri`; aria2 schedules the
//! actual transfers. Every item produces exactly one [`DispatchOutcome`].

pub mod dispatcher;
pub mod error;
pub mod rpc;

pub use dispatcher::{Aria2Dispatcher, DispatchOutcome, DispatchSummary};
pub use error::{DispatchError, Result};
pub use rpc::{RpcError, RpcRequest, RpcResponse};
