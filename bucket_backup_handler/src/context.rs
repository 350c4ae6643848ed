use crate::config::Config;
use bucket_backup::{
    domain::services::{BackupServiceImpl, ReplicatorImpl},
    outbound::sns::SnsNotifier,
};
use s3_client::S3;
use std::sync::Arc;

pub type Service = BackupServiceImpl<ReplicatorImpl<S3>, SnsNotifier>;

#[derive(Clone)]
pub struct Context {
    pub service: Arc<Service>,
    pub config: Arc<Config>,
}
