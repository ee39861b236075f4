use serde::{Deserialize, Serialize};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Default bounded wait for a page of transactions, in milliseconds.
const fn default_page_timeout_ms() -> u64 {
    60_000
}

/// Configuration for the transaction feed the importer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedConfig {
    /// Base URL of the feed service.
    pub url: String,
    /// Access token for the feed service. Sensitive and redacted in debug output.
    pub token: Option<SerializableSecretString>,
    /// Alias of the transaction feed to create or resume.
    pub alias: String,
    /// Filter expression restricting which transactions the feed delivers.
    #[serde(default)]
    pub filter: String,
    /// Bounded wait for the ascending long-poll page query, in milliseconds.
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,
}

impl FeedConfig {
    /// Validates feed settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::EmptyFeedUrl);
        }

        if self.alias.is_empty() {
            return Err(ValidationError::EmptyFeedAlias);
        }

        if self.page_timeout_ms == 0 {
            return Err(ValidationError::ZeroPageTimeout);
        }

        Ok(())
    }
}
