//! This module defines the services that are exposed by this crate

use crate::domain::{
    models::{
        BackupJob, BackupRunErr, BucketLocation, CopyFailure, EnumerationErr, RoutingRules,
        RunOutcome, RunStatus, SourceObject,
    },
    ports::{BackupService, Notifier, ObjectStore, ReplicatorService},
};
use futures::StreamExt;
use std::collections::HashSet;
use tokio::time::Instant;


/// The default number of copies kept in flight at once
pub const DEFAULT_COPY_CONCURRENCY: usize = 16;

/// a matched object and the bucket it is routed to
#[derive(Debug)]
struct CopyJob {
    object: SourceObject,
    destination: String,
}

#[derive(Debug)]
enum CopyResult {
    Copied,
    Failed(CopyFailure),
    NotAttempted,
}

/// concrete struct which implements [ReplicatorService]
#[derive(Clone)]
pub struct ReplicatorImpl<S> {
    store: S,
    copy_concurrency: usize,
}

impl<S> ReplicatorImpl<S>
where
    S: ObjectStore,
    anyhow::Error: From<S::Err>,
{
    /// create a new instance of this service copying up to [DEFAULT_COPY_CONCURRENCY] objects at once
    pub fn new(store: S) -> Self {
        ReplicatorImpl {
            store,
            copy_concurrency: DEFAULT_COPY_CONCURRENCY,
        }
    }

    /// set the maximum number of in flight copies. 1 copies strictly one object at a time
    pub fn with_copy_concurrency(self, copy_concurrency: usize) -> Self {
        ReplicatorImpl {
            copy_concurrency: copy_concurrency.max(1),
            ..self
        }
    }

    /// follow the continuation tokens until the storage reports no further pages.
    /// No page is requested once `deadline` has passed
    #[tracing::instrument(err, skip(self))]
    async fn enumerate(
        &self,
        source: &BucketLocation,
        deadline: Option<Instant>,
    ) -> Result<Vec<SourceObject>, EnumerationErr> {
        let mut objects = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut continuation_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(EnumerationErr::DeadlineReached { pages });
            }

            let page = self
                .store
                .list_page(source, continuation_token.take())
                .await
                .map_err(|e| EnumerationErr::List {
                    location: source.to_string(),
                    pages,
                    reason: format!("{:#}", anyhow::Error::from(e)),
                })?;
            pages += 1;
            tracing::trace!(page = pages, count = page.objects.len(), "listed page");

            objects.extend(page.objects);

            match page.next_continuation_token {
                None => break,
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    return Err(EnumerationErr::RepeatedToken(token));
                }
                Some(token) => continuation_token = Some(token),
            }
        }

        tracing::debug!(pages, count = objects.len(), "enumerated source");
        Ok(objects)
    }

    async fn copy_routed(
        &self,
        source_bucket: &str,
        job: CopyJob,
        deadline: Option<Instant>,
    ) -> CopyResult {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return CopyResult::NotAttempted;
        }

        match self
            .store
            .copy_object(source_bucket, &job.object, &job.destination)
            .await
            .map_err(anyhow::Error::from)
        {
            Ok(()) => {
                tracing::trace!(key = %job.object.key, destination = %job.destination, "copied object");
                CopyResult::Copied
            }
            Err(e) => {
                tracing::error!(error=?e, key = %job.object.key, destination = %job.destination, "unable to copy object");
                CopyResult::Failed(CopyFailure {
                    key: job.object.key,
                    destination: job.destination,
                    error: format!("{e:#}"),
                })
            }
        }
    }
}

impl<S> ReplicatorService for ReplicatorImpl<S>
where
    S: ObjectStore,
    anyhow::Error: From<S::Err>,
{
    #[tracing::instrument(skip(self, rules), fields(rule_count = rules.len()))]
    async fn run_backup(
        &self,
        source: &BucketLocation,
        rules: &RoutingRules,
        deadline: Option<Instant>,
    ) -> RunOutcome {
        let objects = match self.enumerate(source, deadline).await {
            Ok(objects) => objects,
            Err(e) => {
                tracing::error!(error=?e, "unable to enumerate source");
                return RunOutcome::enumeration_failed(e);
            }
        };

        let mut skipped = 0usize;
        let jobs: Vec<CopyJob> = objects
            .into_iter()
            .filter_map(|object| match rules.route(&object.key) {
                Some(rule) => Some(CopyJob {
                    destination: rule.destination.clone(),
                    object,
                }),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        tracing::info!(matched = jobs.len(), skipped, "classified objects");

        let source_bucket = source.bucket.as_str();
        let results: Vec<CopyResult> = futures::stream::iter(jobs)
            .map(|job| self.copy_routed(source_bucket, job, deadline))
            .buffer_unordered(self.copy_concurrency)
            .collect()
            .await;

        let mut copied = 0usize;
        let mut not_attempted = 0usize;
        let mut errors = Vec::new();
        for result in results {
            match result {
                CopyResult::Copied => copied += 1,
                CopyResult::NotAttempted => not_attempted += 1,
                CopyResult::Failed(failure) => errors.push(failure),
            }
        }

        if not_attempted > 0 {
            tracing::warn!(not_attempted, "deadline reached before all copies were started");
        }

        RunOutcome::from_counts(copied, skipped, not_attempted, errors)
    }
}

/// concrete struct which implements [BackupService]
#[derive(Clone)]
pub struct BackupServiceImpl<R, N> {
    replicator: R,
    notifier: N,
}

impl<R, N> BackupServiceImpl<R, N>
where
    R: ReplicatorService,
    N: Notifier,
    anyhow::Error: From<N::Err>,
{
    /// create a new instance of Self
    pub fn new(replicator: R, notifier: N) -> Self {
        BackupServiceImpl {
            replicator,
            notifier,
        }
    }
}

impl<R, N> BackupService for BackupServiceImpl<R, N>
where
    R: ReplicatorService,
    N: Notifier,
    anyhow::Error: From<N::Err>,
{
    #[tracing::instrument(skip(self, job), fields(source = %job.source))]
    async fn run_and_notify(&self, job: &BackupJob) -> Result<RunOutcome, BackupRunErr> {
        let outcome = self
            .replicator
            .run_backup(&job.source, &job.rules, job.deadline)
            .await;

        tracing::info!(
            status = %outcome.status,
            copied = outcome.copied,
            skipped = outcome.skipped,
            failed = outcome.errors.len(),
            not_attempted = outcome.not_attempted,
            "backup run finished"
        );

        let message = outcome.notification(&job.source, job.max_reported_errors);
        if let Err(e) = self
            .notifier
            .publish(&message)
            .await
            .map_err(anyhow::Error::from)
        {
            tracing::error!(error=?e, "unable to publish backup notification");
        }

        match outcome.status {
            RunStatus::Failure => Err(BackupRunErr::Failed(Box::new(outcome))),
            RunStatus::Success | RunStatus::PartialFailure => Ok(outcome),
        }
    }
}
