//! This module defines all of the ports that the backup domain requires

use crate::domain::models::{
    BackupJob, BackupRunErr, BucketLocation, NotificationMessage, ObjectPage, RoutingRules,
    RunOutcome, SourceObject,
};
use std::sync::Arc;
use tokio::time::Instant;

/// Trait for reading from and copying between buckets
pub trait ObjectStore: Send + Sync + 'static {
    /// The error type that can occur
    type Err: Send;

    /// list one page of the objects in `location`.
    /// `continuation_token` is [None] for the first page and the previous page's token afterwards
    fn list_page(
        &self,
        location: &BucketLocation,
        continuation_token: Option<String>,
    ) -> impl Future<Output = Result<ObjectPage, Self::Err>> + Send;

    /// copy `object` from `source_bucket` into `destination_bucket` under the same key
    fn copy_object(
        &self,
        source_bucket: &str,
        object: &SourceObject,
        destination_bucket: &str,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send;
}

impl<T: ObjectStore> ObjectStore for Arc<T> {
    type Err = T::Err;

    fn list_page(
        &self,
        location: &BucketLocation,
        continuation_token: Option<String>,
    ) -> impl Future<Output = Result<ObjectPage, Self::Err>> + Send {
        (**self).list_page(location, continuation_token)
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        object: &SourceObject,
        destination_bucket: &str,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send {
        (**self).copy_object(source_bucket, object, destination_bucket)
    }
}

/// Trait for delivering the run summary
pub trait Notifier: Send + Sync + 'static {
    /// The error type that can occur
    type Err: Send;

    /// publish a message to the configured target
    fn publish(
        &self,
        message: &NotificationMessage,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send;
}

/// The service which performs a single replication pass
pub trait ReplicatorService: Send + Sync + 'static {
    /// enumerate `source`, route every object through `rules` and copy the matches.
    /// No copies are started once `deadline` has passed
    fn run_backup(
        &self,
        source: &BucketLocation,
        rules: &RoutingRules,
        deadline: Option<Instant>,
    ) -> impl Future<Output = RunOutcome> + Send;
}

/// The entry point a trigger invokes once per run
pub trait BackupService: Send + Sync + 'static {
    /// run the backup described by `job` and publish exactly one notification about it.
    /// Returns an error when the outcome has status [crate::domain::models::RunStatus::Failure]
    fn run_and_notify(
        &self,
        job: &BackupJob,
    ) -> impl Future<Output = Result<RunOutcome, BackupRunErr>> + Send;
}
