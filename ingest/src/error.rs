//! Error types and result definitions for the importer.
//!
//! Provides a kind-classified error type with captured diagnostic metadata. Every
//! fallible operation in this crate returns [`IngestResult`], and callers branch on
//! [`ErrorKind`] to decide whether a failure is transient, benign, or fatal.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for importer operations using [`IngestError`] as the error type.
pub type IngestResult<T> = Result<T, IngestError>;

/// Specific categories of errors that can occur while importing.
///
/// The import loop routes on these kinds: a timed-out page fetch is retried
/// silently, any other per-iteration error is logged and retried, and only feed
/// setup failures abort startup.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Feed errors
    FeedSetupFailed,
    FeedAlreadyExists,
    FeedRequestTimedOut,
    FeedRequestFailed,

    // Store errors
    DestinationConnectionFailed,
    EventWriteFailed,

    // Data errors
    ConversionError,
    DeserializationError,
    InvalidData,

    // General errors
    ConfigError,
    IoError,
    Unknown,
}

/// Detailed payload stored for an [`IngestError`].
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for importer operations.
///
/// Carries an [`ErrorKind`] for classification, a static description, optional
/// dynamic detail, the callsite location, and a captured backtrace.
#[derive(Debug, Clone)]
pub struct IngestError {
    payload: ErrorPayload,
}

impl IngestError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the detailed error information, if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        self.payload.backtrace.as_ref()
    }

    /// Attaches an originating [`error::Error`] to this error and returns the
    /// modified instance. The stored source is exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Creates an [`IngestError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        IngestError {
            payload: ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            },
        }
    }
}

impl PartialEq for IngestError {
    fn eq(&self, other: &IngestError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.payload.kind,
            self.payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        if let Some(detail) = self.payload.detail.as_deref() {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for IngestError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates an [`IngestError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for IngestError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> IngestError {
        IngestError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`IngestError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for IngestError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> IngestError {
        IngestError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`IngestError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for IngestError {
    #[track_caller]
    fn from(err: std::io::Error) -> IngestError {
        let detail = err.to_string();
        IngestError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`IngestError`] with [`ErrorKind::DeserializationError`].
impl From<serde_json::Error> for IngestError {
    #[track_caller]
    fn from(err: serde_json::Error) -> IngestError {
        let detail = err.to_string();
        IngestError::from_components(
            ErrorKind::DeserializationError,
            Cow::Borrowed("JSON deserialization failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`chrono::ParseError`] to [`IngestError`] with [`ErrorKind::ConversionError`].
impl From<chrono::ParseError> for IngestError {
    #[track_caller]
    fn from(err: chrono::ParseError) -> IngestError {
        let detail = err.to_string();
        IngestError::from_components(
            ErrorKind::ConversionError,
            Cow::Borrowed("Datetime parsing failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`sqlx::Error`] to [`IngestError`] with the appropriate error kind.
///
/// Connection pool and I/O failures map to [`ErrorKind::DestinationConnectionFailed`];
/// everything else is classified as [`ErrorKind::EventWriteFailed`]. Duplicate-key
/// classification happens before this conversion, in the duplicate guard.
impl From<sqlx::Error> for IngestError {
    #[track_caller]
    fn from(err: sqlx::Error) -> IngestError {
        let kind = match &err {
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                ErrorKind::DestinationConnectionFailed
            }
            _ => ErrorKind::EventWriteFailed,
        };

        let detail = err.to_string();
        IngestError::from_components(
            kind,
            Cow::Borrowed("Database operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
