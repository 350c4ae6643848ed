//! Typed representation of the deployment environment the process runs in

use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// The name of the environment variable holding the [Environment]
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// The current environment the application is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Dev and or staging environment
    Develop,
    /// Running on a developer machine
    Local,
}

/// Represents a value which cannot be converted into an [Environment]
#[derive(Debug, Error)]
#[error("Could not convert {0} into an environment value")]
pub struct UnknownEnvironment(String);

impl Environment {
    /// Resolve the environment through the input lookup function, falling back to
    /// [Environment::Production] when the value is missing or unrecognized
    pub fn from_lookup<F, E>(lookup: F) -> Self
    where
        F: Fn(&'static str) -> Result<String, E>,
    {
        lookup(ENVIRONMENT_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Environment::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "prod"),
            Environment::Develop => write!(f, "dev"),
            Environment::Local => write!(f, "local"),
        }
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(environment: &str) -> Result<Self, UnknownEnvironment> {
        match environment.trim() {
            "prod" => Ok(Environment::Production),
            "dev" => Ok(Environment::Develop),
            "local" => Ok(Environment::Local),
            s => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::VarError;

    #[test]
    fn it_parses_known_values() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Develop);
        assert_eq!(" local ".parse::<Environment>().unwrap(), Environment::Local);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn it_round_trips_display() {
        for env in [
            Environment::Production,
            Environment::Develop,
            Environment::Local,
        ] {
            assert_eq!(env.to_string().parse::<Environment>().unwrap(), env);
        }
    }

    #[test]
    fn it_falls_back_to_prod() {
        let missing = Environment::from_lookup(|_| Err::<String, _>(VarError::NotPresent));
        assert_eq!(missing, Environment::Production);

        let garbage = Environment::from_lookup(|_| Ok::<_, VarError>("nope".to_string()));
        assert_eq!(garbage, Environment::Production);

        let local = Environment::from_lookup(|name| {
            assert_eq!(name, ENVIRONMENT_VAR);
            Ok::<_, VarError>("local".to_string())
        });
        assert_eq!(local, Environment::Local);
    }
}
