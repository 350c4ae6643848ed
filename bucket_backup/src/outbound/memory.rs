//! An in memory [ObjectStore] with paged listings and failure injection, used for testing

use crate::domain::{
    models::{BucketLocation, ObjectPage, SourceObject},
    ports::ObjectStore,
};
use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use thiserror::Error;

/// The page size used when none is configured, matching the S3 maximum
pub const DEFAULT_PAGE_SIZE: usize = 1000;

type Buckets = HashMap<String, BTreeMap<String, Vec<u8>>>;

/// The errors the [MemoryObjectStore] produces
#[derive(Debug, Error)]
pub enum MemoryStoreErr {
    /// the bucket was never created
    #[error("bucket {0} does not exist")]
    NoSuchBucket(String),
    /// the source key does not exist
    #[error("key {0} does not exist")]
    NoSuchKey(String),
    /// a copy failure registered through [MemoryObjectStore::fail_copies]
    #[error("injected failure copying {0}")]
    InjectedCopyFailure(String),
    /// a listing failure registered through [MemoryObjectStore::fail_listing_on_page]
    #[error("injected failure listing page {0}")]
    InjectedListFailure(usize),
}

/// Buckets held in memory. Listings are returned in key order, `page_size` keys at a time
#[derive(Debug)]
pub struct MemoryObjectStore {
    buckets: Mutex<Buckets>,
    /// remaining injected failures per key
    copy_failures: Mutex<HashMap<String, usize>>,
    page_size: usize,
    copy_latency: Option<Duration>,
    fail_listing_on_page: Option<usize>,
    list_calls: AtomicUsize,
    copy_calls: AtomicUsize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        MemoryObjectStore {
            buckets: Default::default(),
            copy_failures: Default::default(),
            page_size: DEFAULT_PAGE_SIZE,
            copy_latency: None,
            fail_listing_on_page: None,
            list_calls: AtomicUsize::new(0),
            copy_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryObjectStore {
    /// create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// return at most `page_size` objects per listing call
    pub fn with_page_size(self, page_size: usize) -> Self {
        MemoryObjectStore {
            page_size: page_size.max(1),
            ..self
        }
    }

    /// sleep for `latency` before every copy
    pub fn with_copy_latency(self, latency: Duration) -> Self {
        MemoryObjectStore {
            copy_latency: Some(latency),
            ..self
        }
    }

    /// fail the listing call for the zero based page `page`
    pub fn fail_listing_on_page(self, page: usize) -> Self {
        MemoryObjectStore {
            fail_listing_on_page: Some(page),
            ..self
        }
    }

    /// create an empty bucket
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock_buckets().entry(bucket.to_string()).or_default();
        self
    }

    /// write an object, creating the bucket if needed
    pub fn put_object(&self, bucket: &str, key: &str, content: &[u8]) {
        self.lock_buckets()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), content.to_vec());
    }

    /// make the next `times` copies of `key` fail
    pub fn fail_copies(&self, key: &str, times: usize) {
        self.copy_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), times);
    }

    /// read an object
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock_buckets()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// a copy of every object in the bucket
    pub fn snapshot(&self, bucket: &str) -> BTreeMap<String, Vec<u8>> {
        self.lock_buckets().get(bucket).cloned().unwrap_or_default()
    }

    /// the number of listing calls made so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// the number of copy calls made so far
    pub fn copy_calls(&self) -> usize {
        self.copy_calls.load(Ordering::SeqCst)
    }

    fn lock_buckets(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_copy_failure(&self, key: &str) -> bool {
        let mut failures = self
            .copy_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match failures.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn page(
        &self,
        location: &BucketLocation,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, MemoryStoreErr> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing_on_page == Some(call) {
            return Err(MemoryStoreErr::InjectedListFailure(call));
        }

        let buckets = self.lock_buckets();
        let objects = buckets
            .get(&location.bucket)
            .ok_or_else(|| MemoryStoreErr::NoSuchBucket(location.bucket.clone()))?;

        // the continuation token is the last key of the previous page
        let start = match continuation_token {
            Some(token) => Bound::Excluded(token),
            None => Bound::Unbounded,
        };
        let prefix = location.prefix.as_deref().unwrap_or_default();
        let mut remaining = objects
            .range((start, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(prefix));

        let page: Vec<SourceObject> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(key, content)| SourceObject {
                key: key.clone(),
                size: content.len() as i64,
            })
            .collect();

        let next_continuation_token = match remaining.next() {
            Some(_) => page.last().map(|obj| obj.key.clone()),
            None => None,
        };

        Ok(ObjectPage {
            objects: page,
            next_continuation_token,
        })
    }

    fn copy(
        &self,
        source_bucket: &str,
        key: &str,
        destination_bucket: &str,
    ) -> Result<(), MemoryStoreErr> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_copy_failure(key) {
            return Err(MemoryStoreErr::InjectedCopyFailure(key.to_string()));
        }

        let mut buckets = self.lock_buckets();
        let content = buckets
            .get(source_bucket)
            .ok_or_else(|| MemoryStoreErr::NoSuchBucket(source_bucket.to_string()))?
            .get(key)
            .cloned()
            .ok_or_else(|| MemoryStoreErr::NoSuchKey(key.to_string()))?;

        buckets
            .get_mut(destination_bucket)
            .ok_or_else(|| MemoryStoreErr::NoSuchBucket(destination_bucket.to_string()))?
            .insert(key.to_string(), content);

        Ok(())
    }
}

impl ObjectStore for MemoryObjectStore {
    type Err = MemoryStoreErr;

    async fn list_page(
        &self,
        location: &BucketLocation,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, MemoryStoreErr> {
        self.page(location, continuation_token)
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        object: &SourceObject,
        destination_bucket: &str,
    ) -> Result<(), MemoryStoreErr> {
        if let Some(latency) = self.copy_latency {
            tokio::time::sleep(latency).await;
        }
        self.copy(source_bucket, &object.key, destination_bucket)
    }
}
