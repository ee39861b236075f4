use config::shared::ImporterConfig;
use ingest::concurrency::shutdown::create_shutdown_channel;
use ingest::pipeline::ImportPipeline;
use ingest::store::postgres::PostgresEventStore;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};

use crate::error::ImporterResult;
use crate::feed_client::HttpFeedClient;

/// Upper bound on destination pool connections; one page is written sequentially,
/// so a small pool is enough.
const MAX_POOL_CONNECTIONS: u32 = 4;

/// Starts the importer service with the provided configuration.
///
/// Connects to the destination database and the feed service, then runs the import
/// loop until a termination signal arrives.
pub async fn start_importer_with_config(importer_config: ImporterConfig) -> ImporterResult<()> {
    info!("starting importer service");

    log_config(&importer_config);

    let client = HttpFeedClient::new(&importer_config.feed)?;
    let store =
        PostgresEventStore::connect(&importer_config.pg_connection, MAX_POOL_CONNECTIONS).await?;

    let pipeline = ImportPipeline::connect(
        client,
        store,
        &importer_config.feed,
        importer_config.columns.clone(),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

    tokio::spawn(async move {
        if wait_for_termination_signal().await.is_ok() {
            info!("termination signal received");
        }

        let _ = shutdown_tx.send(());
    });

    pipeline.run(shutdown_rx).await?;

    info!("importer service completed");

    Ok(())
}

/// Completes when the process receives SIGTERM or SIGINT.
async fn wait_for_termination_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }

    Ok(())
}

fn log_config(config: &ImporterConfig) {
    debug!(
        host = %config.pg_connection.host,
        port = config.pg_connection.port,
        database = %config.pg_connection.name,
        tls = config.pg_connection.tls.enabled,
        "using destination database config"
    );
    debug!(
        url = %config.feed.url,
        alias = %config.feed.alias,
        filter = %config.feed.filter,
        page_timeout_ms = config.feed.page_timeout_ms,
        "using feed config"
    );
    debug!(
        transaction_columns = config.columns.transaction.len(),
        input_columns = config.columns.input.len(),
        output_columns = config.columns.output.len(),
        "using custom column config"
    );
}
