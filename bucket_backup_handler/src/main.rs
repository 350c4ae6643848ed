#![recursion_limit = "256"]

mod config;
mod context;
mod handler;

use anyhow::Context as _;
use backup_entrypoint::BackupEntrypoint;
use bucket_backup::{
    domain::services::{BackupServiceImpl, ReplicatorImpl},
    outbound::sns::SnsNotifier,
};
use config::Config;
use handler::handler;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    BackupEntrypoint::from_env().init();
    tracing::trace!("initiating lambda");

    let config = Config::from_env().context("all necessary env vars should be available")?;

    tracing::trace!(?config, "initialized config");

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    let s3_client = s3_client::S3::new(aws_sdk_s3::Client::new(&aws_config));
    let sns_client = sns_client::SNS::new(aws_sdk_sns::Client::new(&aws_config));

    let replicator = ReplicatorImpl::new(s3_client).with_copy_concurrency(config.copy_concurrency);
    let notifier = SnsNotifier::new(sns_client, &config.notification_topic_arn);

    let ctx = context::Context {
        service: Arc::new(BackupServiceImpl::new(replicator, notifier)),
        config: Arc::new(config),
    };

    let func = service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let ctx = ctx.clone();

        async move { handler(ctx, event).await }
    });

    run(func).await
}
