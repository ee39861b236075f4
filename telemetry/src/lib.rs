//! Telemetry initialization shared by the importer binaries and tests.

pub mod tracing;
