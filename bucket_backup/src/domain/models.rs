//! This module defines the data that flows through a backup run

use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Prefix placed in front of every notification subject
pub const SUBJECT_PREFIX: &str = "[bucket-backup]";

/// The maximum subject length accepted by the notification transport
pub const MAX_SUBJECT_LEN: usize = 100;

/// A bucket, optionally narrowed down to the keys under a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLocation {
    /// the name of the bucket
    pub bucket: String,
    /// only keys starting with this prefix belong to the location
    pub prefix: Option<String>,
}

impl BucketLocation {
    /// create a location covering the whole bucket
    pub fn new(bucket: impl Into<String>) -> Self {
        BucketLocation {
            bucket: bucket.into(),
            prefix: None,
        }
    }

    /// narrow the location down to the keys under `prefix`. An empty prefix is the whole bucket
    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        BucketLocation {
            prefix: (!prefix.is_empty()).then_some(prefix),
            ..self
        }
    }
}

impl Display for BucketLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "s3://{}/{}", self.bucket, prefix),
            None => write!(f, "s3://{}", self.bucket),
        }
    }
}

/// An object found in the source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceObject {
    /// the full key of the object
    pub key: String,
    /// the size of the object in bytes
    pub size: i64,
}

/// A single page of a listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// the objects on this page
    pub objects: Vec<SourceObject>,
    /// present when the storage has more pages, pass it back to get the next one
    pub next_continuation_token: Option<String>,
}

/// Routes keys starting with `prefix` into the `destination` bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    /// literal key prefix
    pub prefix: String,
    /// the bucket matched objects are copied into
    pub destination: String,
}

impl RoutingRule {
    /// create a new rule
    pub fn new(prefix: impl Into<String>, destination: impl Into<String>) -> Self {
        RoutingRule {
            prefix: prefix.into(),
            destination: destination.into(),
        }
    }

    /// true if `key` falls under this rule
    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }
}

/// An ordered list of [RoutingRule]. The first matching rule wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingRules(Vec<RoutingRule>);

/// An error which can occur while parsing [RoutingRules]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingRuleParseErr {
    /// the entry has no `=` between prefix and destination
    #[error("routing rule `{0}` must be of the form prefix=destination")]
    MissingSeparator(String),
    /// the entry has an empty prefix
    #[error("routing rule `{0}` has an empty prefix")]
    EmptyPrefix(String),
    /// the entry has an empty destination
    #[error("routing rule `{0}` has an empty destination")]
    EmptyDestination(String),
}

impl RoutingRules {
    /// create the rules from an ordered list
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        RoutingRules(rules)
    }

    /// find the rule the input key routes to
    pub fn route(&self, key: &str) -> Option<&RoutingRule> {
        self.0.iter().find(|rule| rule.matches(key))
    }

    /// iterate the rules in priority order
    pub fn iter(&self) -> impl Iterator<Item = &RoutingRule> {
        self.0.iter()
    }

    /// the number of rules
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// true when there are no rules, in which case every object is skipped
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for RoutingRules {
    type Err = RoutingRuleParseErr;

    /// parses a comma separated list of `prefix=destination` entries.
    /// Whitespace around an entry and around the destination is ignored, the prefix is
    /// taken literally up to the first `=`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (prefix, destination) = entry
                    .split_once('=')
                    .ok_or_else(|| RoutingRuleParseErr::MissingSeparator(entry.to_string()))?;
                let destination = destination.trim();
                if prefix.is_empty() {
                    return Err(RoutingRuleParseErr::EmptyPrefix(entry.to_string()));
                }
                if destination.is_empty() {
                    return Err(RoutingRuleParseErr::EmptyDestination(entry.to_string()));
                }
                Ok(RoutingRule::new(prefix, destination))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RoutingRules)
    }
}

/// The aggregate status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// every matched object was copied
    Success,
    /// some objects were copied, others failed or were never attempted
    PartialFailure,
    /// the listing failed or no copy succeeded
    Failure,
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "SUCCESS"),
            RunStatus::PartialFailure => write!(f, "PARTIAL_FAILURE"),
            RunStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// A copy which did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    /// the key of the object
    pub key: String,
    /// the bucket the object should have been copied into
    pub destination: String,
    /// rendered error chain
    pub error: String,
}

/// The finalized result of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// the aggregate status
    pub status: RunStatus,
    /// objects copied successfully
    pub copied: usize,
    /// objects which matched no routing rule
    pub skipped: usize,
    /// matched objects which were not started because the deadline passed
    pub not_attempted: usize,
    /// per object failures, ordered by key
    pub errors: Vec<CopyFailure>,
    /// set when the source could not be enumerated
    pub enumeration_error: Option<String>,
}

impl RunOutcome {
    /// the outcome of a run whose listing failed. No copies are attempted
    pub fn enumeration_failed(error: impl Display) -> Self {
        RunOutcome {
            status: RunStatus::Failure,
            copied: 0,
            skipped: 0,
            not_attempted: 0,
            errors: Vec::new(),
            enumeration_error: Some(error.to_string()),
        }
    }

    /// build the outcome from the per object tallies, deriving the status
    pub fn from_counts(
        copied: usize,
        skipped: usize,
        not_attempted: usize,
        mut errors: Vec<CopyFailure>,
    ) -> Self {
        errors.sort_by(|a, b| a.key.cmp(&b.key));
        let status = match (copied, errors.len(), not_attempted) {
            (_, 0, 0) => RunStatus::Success,
            (0, failed, _) if failed > 0 => RunStatus::Failure,
            _ => RunStatus::PartialFailure,
        };
        RunOutcome {
            status,
            copied,
            skipped,
            not_attempted,
            errors,
            enumeration_error: None,
        }
    }

    /// the count of objects which matched a routing rule
    pub fn matched(&self) -> usize {
        self.copied + self.errors.len() + self.not_attempted
    }

    /// render the outcome as a human readable message, listing at most `max_errors` copy errors
    pub fn notification(&self, source: &BucketLocation, max_errors: usize) -> NotificationMessage {
        let subject: String = format!("{SUBJECT_PREFIX} {}: {source}", self.status)
            .chars()
            .take(MAX_SUBJECT_LEN)
            .collect();

        let mut lines = vec![
            format!("Backup of {source} finished with status {}.", self.status),
            String::new(),
            format!("Copied: {}", self.copied),
            format!("Skipped (no matching prefix): {}", self.skipped),
            format!("Failed: {}", self.errors.len()),
            format!("Not attempted (deadline reached): {}", self.not_attempted),
        ];

        if let Some(error) = &self.enumeration_error {
            lines.push(String::new());
            lines.push(format!("Listing the source failed: {error}"));
        }

        if !self.errors.is_empty() {
            lines.push(String::new());
            lines.push("Errors:".to_string());
            lines.extend(
                self.errors
                    .iter()
                    .take(max_errors)
                    .map(|e| format!("- {} -> {}: {}", e.key, e.destination, e.error)),
            );
            let remaining = self.errors.len().saturating_sub(max_errors);
            if remaining > 0 {
                lines.push(format!("... and {remaining} more"));
            }
        }

        NotificationMessage {
            subject,
            body: lines.join("\n"),
        }
    }
}

impl Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: copied={} skipped={} failed={} not_attempted={}",
            self.status,
            self.copied,
            self.skipped,
            self.errors.len(),
            self.not_attempted
        )?;
        if let Some(error) = &self.enumeration_error {
            write!(f, " enumeration_error={error}")?;
        }
        Ok(())
    }
}

/// The message published once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// single line subject
    pub subject: String,
    /// multi line body
    pub body: String,
}

/// Everything a single invocation needs to know
#[derive(Debug, Clone)]
pub struct BackupJob {
    /// where objects are read from
    pub source: BucketLocation,
    /// where objects are copied to
    pub rules: RoutingRules,
    /// no listing page is requested and no copy is started after this instant
    pub deadline: Option<tokio::time::Instant>,
    /// the number of copy errors listed in the notification
    pub max_reported_errors: usize,
}

/// The listing of the source could not be completed
#[derive(Debug, Error)]
pub enum EnumerationErr {
    /// the storage returned an error
    #[error("listing {location} failed after {pages} page(s): {reason}")]
    List {
        /// the location being listed
        location: String,
        /// pages fetched before the failure
        pages: usize,
        /// rendered error chain
        reason: String,
    },
    /// the run deadline passed before the listing finished
    #[error("deadline reached after listing {pages} page(s)")]
    DeadlineReached {
        /// pages fetched before the deadline
        pages: usize,
    },
    /// the storage handed out a continuation token it already returned
    #[error("listing returned continuation token {0:?} more than once")]
    RepeatedToken(String),
}

/// Signals a failed run to the trigger
#[derive(Debug, Error)]
pub enum BackupRunErr {
    /// the outcome of the run has status [RunStatus::Failure]
    #[error("backup run failed: {0}")]
    Failed(Box<RunOutcome>),
}
