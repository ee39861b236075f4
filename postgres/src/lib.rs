//! Low-level Postgres helpers for the ledger importer.
//!
//! Holds the connection helper, the fixed-column row types for the three ledger
//! tables, and the lookup queries shared between the importer core and its tests.

pub mod ledger;
