use anyhow::Context;
use aws_sdk_s3 as s3;

/// An object returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub size: i64,
}

/// One page of a `ListObjectsV2` listing
#[derive(Debug, Clone, Default)]
pub struct ListedPage {
    pub objects: Vec<ListedObject>,
    /// Set when the listing was truncated and more pages are available
    pub next_continuation_token: Option<String>,
}

#[tracing::instrument(skip(client))]
pub(crate) async fn list_objects_page(
    client: &s3::Client,
    bucket: &str,
    prefix: Option<&str>,
    continuation_token: Option<&str>,
) -> anyhow::Result<ListedPage> {
    let resp = client
        .list_objects_v2()
        .bucket(bucket)
        .set_prefix(prefix.map(str::to_owned))
        .set_continuation_token(continuation_token.map(str::to_owned))
        .send()
        .await
        .context(format!("could not list objects in bucket {bucket}"))?;

    let objects: Vec<ListedObject> = resp
        .contents()
        .iter()
        .filter_map(|obj| {
            obj.key().map(|key| ListedObject {
                key: key.to_string(),
                size: obj.size().unwrap_or_default(),
            })
        })
        .collect();

    let next_continuation_token = resp.next_continuation_token().map(String::from);

    if resp.is_truncated().unwrap_or(false) && next_continuation_token.is_none() {
        anyhow::bail!("listing of bucket {bucket} was truncated without a continuation token");
    }

    tracing::trace!(count = objects.len(), truncated = ?resp.is_truncated(), "got objects");

    Ok(ListedPage {
        objects,
        next_continuation_token,
    })
}
