use std::fmt;
use std::io;

/// Name of the environment variable which selects the runtime environment.
const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

const DEV_ENV_NAME: &str = "dev";
const PROD_ENV_NAME: &str = "prod";

/// Runtime environment of the importer, used to select configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Development environment.
    Dev,
    /// Production environment.
    Prod,
}

impl Environment {
    /// Loads the environment from the `APP_ENVIRONMENT` env variable.
    ///
    /// Defaults to [`Environment::Dev`] when the variable is unset.
    pub fn load() -> Result<Environment, io::Error> {
        let name = std::env::var(APP_ENVIRONMENT_ENV_NAME).unwrap_or_else(|_| DEV_ENV_NAME.into());
        Environment::from_name(&name)
    }

    /// Parses an environment from its name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Environment, io::Error> {
        match name.to_lowercase().as_str() {
            DEV_ENV_NAME => Ok(Environment::Dev),
            PROD_ENV_NAME => Ok(Environment::Prod),
            other => Err(io::Error::other(format!(
                "{other} is not a supported environment, use either `{DEV_ENV_NAME}` or `{PROD_ENV_NAME}`"
            ))),
        }
    }

    /// Returns the string name of the environment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => DEV_ENV_NAME,
            Environment::Prod => PROD_ENV_NAME,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Environment::from_name("DEV").unwrap(), Environment::Dev);
        assert_eq!(Environment::from_name("Prod").unwrap(), Environment::Prod);
    }

    #[test]
    fn from_name_rejects_unknown_environments() {
        assert!(Environment::from_name("staging").is_err());
    }
}
