//! Ledger feed importer service binary.
//!
//! Loads configuration, initializes tracing, and runs the import pipeline that
//! reads transactions from a feed service and writes them to Postgres, until a
//! termination signal arrives.

use telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::{ImporterConfig, load_importer_config};
use crate::core::start_importer_with_config;
use crate::error::ImporterResult;

mod config;
mod core;
mod error;
mod feed_client;

/// Entry point for the importer service.
///
/// Loads configuration, initializes tracing, starts the async runtime, and
/// launches the import pipeline.
fn main() -> ImporterResult<()> {
    let importer_config = load_importer_config()?;

    init_tracing(env!("CARGO_BIN_NAME"))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(importer_config))?;

    Ok(())
}

/// Main async entry point that starts the import pipeline and reports failures.
async fn async_main(importer_config: ImporterConfig) -> ImporterResult<()> {
    if let Err(err) = start_importer_with_config(importer_config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
