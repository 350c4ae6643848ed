use anyhow::Context;

/// The maximum length SNS accepts for a message subject
pub const MAX_SUBJECT_LEN: usize = 100;

#[derive(Clone, Debug)]
pub struct SNS {
    inner: aws_sdk_sns::Client,
}

impl SNS {
    pub fn new(inner: aws_sdk_sns::Client) -> Self {
        Self { inner }
    }

    /// Publishes a message with a subject line. The subject is used as the title of
    /// email subscriptions and must be at most [MAX_SUBJECT_LEN] characters.
    #[tracing::instrument(skip(self, message))]
    pub async fn publish_with_subject(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        if subject.chars().count() > MAX_SUBJECT_LEN {
            anyhow::bail!("subject exceeds {MAX_SUBJECT_LEN} characters");
        }

        self.inner
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .context(format!("could not publish to topic {topic_arn}"))?;

        Ok(())
    }
}
