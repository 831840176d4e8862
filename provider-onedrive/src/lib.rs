//! # OneDrive Provider
//!
//! Reads a OneDrive tree through Microsoft Graph and flattens it into
//! download items.
//!
//! ## Overview
//!
//! This module provides:
//! - [`OneDriveConnector`]: one selective Graph query per call, either the
//!   children of a folder or the record of a single file
//! - [`DriveReader`]: the seam the collector walks through
//! - [`TreeCollector`]: depth-first expansion of the configured targets into
//!   an ordered [`Collection`](bridge_traits::storage::Collection)

pub mod collector;
pub mod connector;
pub mod error;
pub mod types;

pub use collector::TreeCollector;
pub use connector::{DriveReader, ListingMode, OneDriveConnector, GRAPH_API_BASE};
pub use error::{OneDriveError, Result};
pub use types::{ChildSummary, ItemSummary, RemoteNode};
