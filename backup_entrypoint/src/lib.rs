#![deny(missing_docs)]
//! Standardized initialization for the backup binaries.
//! Loads `.env`, installs the panic hook and configures tracing for the current [Environment]

mod environment;

pub use environment::{ENVIRONMENT_VAR, Environment, UnknownEnvironment};

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_tree::HierarchicalLayer;

/// The name of the environment variable which switches local runs to tree output.
/// Its value is the indent width
pub const TREE_TRACING_INDENT_VAR: &str = "TREE_TRACING_INDENT";

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// multi line, coloured output with file and line
    Pretty,
    /// spans rendered as an indented tree
    Tree {
        /// the indent width of a nested span
        indent: usize,
    },
    /// one flattened json object per event, for log ingestion
    Json,
}

impl LogFormat {
    /// Deployed environments always log json. Local runs log pretty unless a valid tree
    /// indent is supplied
    pub fn resolve(env: Environment, tree_indent: Option<&str>) -> Self {
        match env {
            Environment::Production | Environment::Develop => LogFormat::Json,
            Environment::Local => tree_indent
                .and_then(|indent| indent.trim().parse().ok())
                .filter(|indent| *indent > 0)
                .map_or(LogFormat::Pretty, |indent| LogFormat::Tree { indent }),
        }
    }
}

/// Defines the behaviour for process initialization
#[derive(Debug)]
pub struct BackupEntrypoint {
    env: Environment,
    format: LogFormat,
}

/// sentinel struct which guarantees that we called [BackupEntrypoint::init]
#[derive(Debug)]
pub struct InitializedEntrypoint(());

impl BackupEntrypoint {
    /// load `.env` and read the process env vars
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(std::env::var)
    }

    /// resolve the [Environment] and [LogFormat] through the input lookup function
    pub fn from_lookup<F, E>(lookup: F) -> Self
    where
        F: Fn(&'static str) -> Result<String, E>,
    {
        let env = Environment::from_lookup(&lookup);
        let tree_indent = lookup(TREE_TRACING_INDENT_VAR).ok();
        BackupEntrypoint {
            env,
            format: LogFormat::resolve(env, tree_indent.as_deref()),
        }
    }

    /// the environment this entrypoint was configured for
    pub fn environment(&self) -> Environment {
        self.env
    }

    /// the format the subscriber will render
    pub fn log_format(&self) -> LogFormat {
        self.format
    }

    /// consume self, install the panic hook and the global subscriber, and return a proof
    /// that it was initialized [InitializedEntrypoint]
    pub fn init(self) -> InitializedEntrypoint {
        std::panic::set_hook(Box::new(tracing_panic::panic_hook));

        match self.format {
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_ansi(true)
                    .with_env_filter(EnvFilter::from_default_env())
                    .with_file(true)
                    .with_line_number(true)
                    .pretty()
                    .init();
            }
            LogFormat::Tree { indent } => {
                Registry::default()
                    .with(EnvFilter::from_default_env())
                    .with(HierarchicalLayer::new(indent).with_targets(true))
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_ansi(false)
                    .with_env_filter(EnvFilter::from_default_env())
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .flatten_event(true)
                    .init();
            }
        }

        tracing::debug!(environment = %self.env, format = ?self.format, "initialized entrypoint");

        InitializedEntrypoint(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, env::VarError};

    fn entrypoint(vars: &[(&'static str, &'static str)]) -> BackupEntrypoint {
        let vars: HashMap<&'static str, &'static str> = vars.iter().copied().collect();
        BackupEntrypoint::from_lookup(|name| {
            vars.get(name)
                .map(|v| v.to_string())
                .ok_or(VarError::NotPresent)
        })
    }

    #[test]
    fn deployed_environments_log_json() {
        let unset = entrypoint(&[(TREE_TRACING_INDENT_VAR, "2")]);
        assert_eq!(unset.environment(), Environment::Production);
        assert_eq!(unset.log_format(), LogFormat::Json);

        let dev = entrypoint(&[(ENVIRONMENT_VAR, "dev"), (TREE_TRACING_INDENT_VAR, "2")]);
        assert_eq!(dev.environment(), Environment::Develop);
        assert_eq!(dev.log_format(), LogFormat::Json);
    }

    #[test]
    fn local_logs_pretty_by_default() {
        let local = entrypoint(&[(ENVIRONMENT_VAR, "local")]);
        assert_eq!(local.environment(), Environment::Local);
        assert_eq!(local.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn local_tree_indent_switches_to_tree() {
        let local = entrypoint(&[(ENVIRONMENT_VAR, "local"), (TREE_TRACING_INDENT_VAR, " 4 ")]);
        assert_eq!(local.log_format(), LogFormat::Tree { indent: 4 });
    }

    #[test]
    fn unusable_tree_indent_is_ignored() {
        assert_eq!(
            LogFormat::resolve(Environment::Local, Some("wide")),
            LogFormat::Pretty
        );
        assert_eq!(
            LogFormat::resolve(Environment::Local, Some("0")),
            LogFormat::Pretty
        );
    }
}
