use anyhow::Context;
use tracing::instrument;

#[instrument(skip(client))]
pub(crate) async fn copy_to_bucket(
    client: &aws_sdk_s3::Client,
    source_bucket: &str,
    key: &str,
    destination_bucket: &str,
) -> anyhow::Result<()> {
    client
        .copy_object()
        .bucket(destination_bucket)
        .copy_source(copy_source(source_bucket, key))
        .key(key)
        .send()
        .await
        .context(format!(
            "could not copy {key} from bucket {source_bucket} to bucket {destination_bucket}"
        ))?;

    Ok(())
}

/// Builds the `CopySource` header value. Key segments must be url encoded,
/// the `/` separators are kept as is.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{encoded_key}")
}

#[cfg(test)]
mod tests {
    use super::copy_source;

    #[test]
    fn it_keeps_plain_keys() {
        assert_eq!(
            copy_source("source", "documents/2024/report.pdf"),
            "source/documents/2024/report.pdf"
        );
    }

    #[test]
    fn it_encodes_key_segments() {
        assert_eq!(
            copy_source("source", "photos/summer trip/a+b.jpg"),
            "source/photos/summer%20trip/a%2Bb.jpg"
        );
    }

    #[test]
    fn it_keeps_empty_segments() {
        assert_eq!(copy_source("source", "logs//x"), "source/logs//x");
    }
}
