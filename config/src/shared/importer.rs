use serde::{Deserialize, Serialize};

use crate::shared::{CustomColumnsConfig, FeedConfig, PgConnectionConfig, ValidationError};

/// Top-level configuration for the importer service.
///
/// Combines the feed to consume, the database to replicate into, and the custom
/// column mapping applied at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ImporterConfig {
    /// Connection configuration for the destination Postgres database.
    pub pg_connection: PgConnectionConfig,
    /// Transaction feed settings.
    pub feed: FeedConfig,
    /// Custom columns derived from transactions, inputs, and outputs at write time.
    #[serde(default)]
    pub columns: CustomColumnsConfig,
}

impl ImporterConfig {
    /// Validates the whole importer configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pg_connection.tls.validate()?;
        self.feed.validate()?;
        self.columns.validate()?;

        Ok(())
    }
}
