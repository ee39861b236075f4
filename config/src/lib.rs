//! Shared configuration types and loading for the ledger importer.
//!
//! Configuration is loaded hierarchically from a base file, an environment-specific
//! file, and `APP_`-prefixed environment variable overrides. Secrets are wrapped so
//! they are redacted in debug output.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod environment;
pub mod load;
pub mod shared;

pub use environment::Environment;
pub use load::load_config;

/// A secret string which supports serialization.
///
/// [`secrecy::SecretString`] deliberately does not implement [`Serialize`]; this
/// wrapper adds it for the places where config round-tripping is needed, while
/// keeping the redacted [`fmt::Debug`] behavior.
#[derive(Clone)]
pub struct SerializableSecretString(SecretString);

impl SerializableSecretString {
    /// Returns the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SerializableSecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SerializableSecretString([REDACTED])")
    }
}

impl From<String> for SerializableSecretString {
    fn from(value: String) -> Self {
        Self(SecretString::new(value))
    }
}

impl Serialize for SerializableSecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.expose_secret())
    }
}

impl<'de> Deserialize<'de> for SerializableSecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from(value))
    }
}
