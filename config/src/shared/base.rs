use thiserror::Error;

/// Errors raised when validating configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates were supplied.
    #[error("trusted root certificates are required when TLS is enabled")]
    MissingTrustedRootCerts,

    /// The feed alias is empty, so the feed can neither be created nor looked up.
    #[error("the feed alias must not be empty")]
    EmptyFeedAlias,

    /// The feed service URL is empty.
    #[error("the feed service url must not be empty")]
    EmptyFeedUrl,

    /// The long-poll page timeout is zero, which would make every fetch time out.
    #[error("the feed page timeout must be greater than zero")]
    ZeroPageTimeout,

    /// A custom column is missing its name or extraction path.
    #[error("custom column `{0}` must have a non-empty name and extraction path")]
    InvalidCustomColumn(String),
}
