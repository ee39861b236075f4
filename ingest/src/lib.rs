//! Core library for the ledger transaction feed importer.
//!
//! Continuously reads pages of transactions from a feed service and replicates each
//! transaction, with its inputs and outputs, into a relational store. Writes are
//! atomic per transaction and idempotent under re-delivery, and the feed cursor only
//! advances after a page has been fully committed.

pub mod concurrency;
pub mod error;
pub mod extract;
pub mod feed;
mod macros;
pub mod pipeline;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
