use std::sync::Once;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;

/// Default log filter applied when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

static TEST_TRACING: Once = Once::new();

/// Initializes the global tracing subscriber for a service binary.
///
/// Log levels are controlled via `RUST_LOG`, falling back to `info`. Every record
/// carries the `service` field so multiple binaries can share a log stream.
pub fn init_tracing(service: &str) -> Result<(), SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    tracing::info!(service, "tracing initialized");

    Ok(())
}

/// Initializes tracing for tests.
///
/// Safe to call from every test; only the first call installs the subscriber.
/// Output is captured by the test harness.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
