use anyhow::Context;
use bucket_backup::domain::{
    models::{BucketLocation, RoutingRules},
    services::DEFAULT_COPY_CONCURRENCY,
};
use std::{env::VarError, str::FromStr, time::Duration};

/// Seconds kept free before the invocation deadline to finalize the outcome and notify
pub const DEFAULT_DEADLINE_MARGIN_SECONDS: u64 = 15;

/// The number of copy errors listed in a notification
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// The bucket (and optional prefix) objects are read from
    pub source: BucketLocation,

    /// Ordered prefix to destination bucket mapping
    pub routing_rules: RoutingRules,

    /// The topic the run summary is published to
    pub notification_topic_arn: String,

    /// The maximum number of copies in flight
    pub copy_concurrency: usize,

    /// Time reserved before the invocation deadline
    pub deadline_margin: Duration,

    /// The number of copy errors listed in the notification
    pub max_reported_errors: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(std::env::var)
    }

    /// Build the config reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        let required =
            |name: &'static str| lookup(name).with_context(|| format!("{name} must be provided"));
        let optional = |name: &'static str| {
            lookup(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let source_bucket = required("SOURCE_BUCKET")?;
        if source_bucket.trim().is_empty() {
            anyhow::bail!("SOURCE_BUCKET must not be empty");
        }
        let mut source = BucketLocation::new(source_bucket.trim());
        if let Some(prefix) = optional("SOURCE_PREFIX") {
            source = source.with_prefix(prefix);
        }

        let routing_rules = RoutingRules::from_str(&required("ROUTING_RULES")?)
            .context("ROUTING_RULES is malformed")?;

        let notification_topic_arn = required("NOTIFICATION_TOPIC_ARN")?;

        let copy_concurrency = parse_or(
            "COPY_CONCURRENCY",
            optional("COPY_CONCURRENCY"),
            DEFAULT_COPY_CONCURRENCY,
        )?;
        if copy_concurrency == 0 {
            anyhow::bail!("COPY_CONCURRENCY must be at least 1");
        }

        let deadline_margin = Duration::from_secs(parse_or(
            "DEADLINE_MARGIN_SECONDS",
            optional("DEADLINE_MARGIN_SECONDS"),
            DEFAULT_DEADLINE_MARGIN_SECONDS,
        )?);

        let max_reported_errors = parse_or(
            "MAX_REPORTED_ERRORS",
            optional("MAX_REPORTED_ERRORS"),
            DEFAULT_MAX_REPORTED_ERRORS,
        )?;

        Ok(Config {
            source,
            routing_rules,
            notification_topic_arn,
            copy_concurrency,
            deadline_margin,
            max_reported_errors,
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .parse()
            .with_context(|| format!("{name} must be a non negative integer, got {v}")),
        None => Ok(default),
    }
}
