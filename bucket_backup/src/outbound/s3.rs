//! [ObjectStore] backed by S3

use crate::domain::{
    models::{BucketLocation, ObjectPage, SourceObject},
    ports::ObjectStore,
};
use s3_client::S3;

/// The largest object `CopyObject` accepts in a single request (5 GiB)
pub const MAX_SINGLE_COPY_BYTES: i64 = 5 * 1024 * 1024 * 1024;

impl ObjectStore for S3 {
    type Err = anyhow::Error;

    async fn list_page(
        &self,
        location: &BucketLocation,
        continuation_token: Option<String>,
    ) -> anyhow::Result<ObjectPage> {
        let page = self
            .list_objects_page(
                &location.bucket,
                location.prefix.as_deref(),
                continuation_token.as_deref(),
            )
            .await?;

        Ok(ObjectPage {
            objects: page
                .objects
                .into_iter()
                .map(|obj| SourceObject {
                    key: obj.key,
                    size: obj.size,
                })
                .collect(),
            next_continuation_token: page.next_continuation_token,
        })
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        object: &SourceObject,
        destination_bucket: &str,
    ) -> anyhow::Result<()> {
        if object.size > MAX_SINGLE_COPY_BYTES {
            anyhow::bail!(
                "object {} is {} bytes, larger than the single request copy limit",
                object.key,
                object.size
            );
        }

        self.copy_to_bucket(source_bucket, &object.key, destination_bucket)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Region};

    fn offline_client() -> S3 {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        S3::new(aws_sdk_s3::Client::from_conf(config))
    }

    #[tokio::test]
    async fn oversized_objects_are_rejected_before_any_request() {
        let object = SourceObject {
            key: "media/huge.mov".to_string(),
            size: MAX_SINGLE_COPY_BYTES + 1,
        };

        let err = offline_client()
            .copy_object("prod-uploads", &object, "backup-media")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "object media/huge.mov is {} bytes, larger than the single request copy limit",
                MAX_SINGLE_COPY_BYTES + 1
            )
        );
    }
}
