//! Shared helpers for unit and integration tests.

mod feed;
mod transactions;

pub use feed::*;
pub use transactions::*;
