use ingest::error::IngestError;
use tracing::subscriber::SetGlobalDefaultError;

/// Result type for importer service operations.
pub type ImporterResult<T> = Result<T, ImporterError>;

/// Error type for the importer service.
///
/// Wraps [`IngestError`] for pipeline errors and adds variants for the
/// infrastructure failures that can only happen during startup.
#[derive(Debug, thiserror::Error)]
pub enum ImporterError {
    #[error("importer error: {0}")]
    Ingest(#[from] IngestError),

    #[error("configuration error: {0}")]
    Config(#[from] config::load::LoadConfigError),

    #[error("configuration error: {0}")]
    Validation(#[from] config::shared::ValidationError),

    #[error("tracing initialization error: {0}")]
    Tracing(#[from] SetGlobalDefaultError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
