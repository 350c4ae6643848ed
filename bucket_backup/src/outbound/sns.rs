//! [Notifier] backed by an SNS topic

use crate::domain::{models::NotificationMessage, ports::Notifier};
use sns_client::SNS;

/// Publishes run summaries to a single SNS topic
#[derive(Clone, Debug)]
pub struct SnsNotifier {
    client: SNS,
    topic_arn: String,
}

impl SnsNotifier {
    /// create a notifier publishing to `topic_arn`
    pub fn new(client: SNS, topic_arn: &str) -> Self {
        SnsNotifier {
            client,
            topic_arn: topic_arn.to_string(),
        }
    }
}

impl Notifier for SnsNotifier {
    type Err = anyhow::Error;

    #[tracing::instrument(err, skip(self, message), fields(topic_arn = %self.topic_arn))]
    async fn publish(&self, message: &NotificationMessage) -> anyhow::Result<()> {
        self.client
            .publish_with_subject(&self.topic_arn, &message.subject, &message.body)
            .await
    }
}
