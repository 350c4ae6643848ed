use crate::context::Context;
use aws_lambda_events::eventbridge::EventBridgeEvent;
use bucket_backup::domain::{models::BackupJob, ports::BackupService};
use lambda_runtime::{Error, LambdaEvent};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[tracing::instrument(skip(ctx, event), fields(request_id = %event.context.request_id))]
pub async fn handler(ctx: Context, event: LambdaEvent<serde_json::Value>) -> Result<(), Error> {
    log_trigger(&event.payload);

    let deadline = remaining_budget(
        event.context.deadline,
        SystemTime::now(),
        ctx.config.deadline_margin,
    )
    .map(|budget| tokio::time::Instant::now() + budget);
    tracing::debug!(?deadline, "computed run deadline");

    let job = BackupJob {
        source: ctx.config.source.clone(),
        rules: ctx.config.routing_rules.clone(),
        deadline,
        max_reported_errors: ctx.config.max_reported_errors,
    };

    // a failed run fails the invocation. Async invokes must be configured with zero
    // retries, each retry reruns the backup and publishes another notification
    let outcome = ctx.service.run_and_notify(&job).await?;
    tracing::info!(%outcome, "backup complete");

    Ok(())
}

/// Scheduled runs arrive as EventBridge events, anything else is an on demand invocation
fn log_trigger(payload: &serde_json::Value) {
    match serde_json::from_value::<EventBridgeEvent>(payload.clone()) {
        Ok(event) => tracing::info!(
            detail_type=?event.detail_type,
            source=?event.source,
            "triggered by eventbridge"
        ),
        Err(_) => tracing::info!("triggered on demand"),
    }
}

/// The time left to issue copies: the invocation deadline (milliseconds since the epoch) minus `margin`.
/// A zero deadline means the runtime did not provide one
fn remaining_budget(deadline_ms: u64, now: SystemTime, margin: Duration) -> Option<Duration> {
    if deadline_ms == 0 {
        return None;
    }
    let deadline = UNIX_EPOCH + Duration::from_millis(deadline_ms);
    let remaining = deadline.duration_since(now).unwrap_or_default();
    Some(remaining.saturating_sub(margin))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW_MS: u64 = 1_760_000_000_000;

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(NOW_MS)
    }

    #[test]
    fn no_deadline_without_context_deadline() {
        assert_eq!(remaining_budget(0, now(), Duration::from_secs(15)), None);
    }

    #[test]
    fn margin_is_reserved() {
        assert_eq!(
            remaining_budget(NOW_MS + 60_000, now(), Duration::from_secs(15)),
            Some(Duration::from_secs(45))
        );
    }

    #[test]
    fn budget_never_goes_negative() {
        assert_eq!(
            remaining_budget(NOW_MS + 5_000, now(), Duration::from_secs(15)),
            Some(Duration::ZERO)
        );
        assert_eq!(
            remaining_budget(NOW_MS - 5_000, now(), Duration::from_secs(15)),
            Some(Duration::ZERO)
        );
    }
}
