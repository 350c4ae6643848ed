mod copy;
mod list;

pub use list::{ListedObject, ListedPage};

#[derive(Clone, Debug)]
pub struct S3 {
    inner: aws_sdk_s3::Client,
}

impl S3 {
    pub fn new(inner: aws_sdk_s3::Client) -> Self {
        Self { inner }
    }

    /// Lists a single page of objects in the bucket, optionally scoped to a prefix.
    /// Pass the `next_continuation_token` of the previous page to resume the listing.
    #[tracing::instrument(skip(self))]
    pub async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> anyhow::Result<ListedPage> {
        list::list_objects_page(&self.inner, bucket, prefix, continuation_token).await
    }

    /// Copies an object into another bucket under the same key.
    #[tracing::instrument(skip(self))]
    pub async fn copy_to_bucket(
        &self,
        source_bucket: &str,
        key: &str,
        destination_bucket: &str,
    ) -> anyhow::Result<()> {
        copy::copy_to_bucket(&self.inner, source_bucket, key, destination_bucket).await
    }
}
