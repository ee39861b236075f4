use config::load_config;

pub use config::shared::ImporterConfig;

use crate::error::ImporterResult;

/// Loads and validates the importer configuration.
///
/// Uses the standard layered configuration loading from [`config`] and validates
/// the resulting [`ImporterConfig`] before returning it.
pub fn load_importer_config() -> ImporterResult<ImporterConfig> {
    let config = load_config::<ImporterConfig>()?;
    config.validate()?;

    Ok(config)
}
