//! Activity retry policy and the retrying activity driver.

use std::time::Duration;

use fulfillment::{FulfilmentEnv, FulfilmentError, OrderState, Stage, StageOutcome, run_stage};

/// Per-attempt start-to-close timeout for every activity.
pub const START_TO_CLOSE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Bounded automatic retry policy for activity failures.
///
/// Applies to every retryable failure class, including per-attempt
/// timeouts; the delivery failure class is classified non-retryable and
/// always fails its attempt terminally.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum forward attempts per activity, first attempt included.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Invokes one stage as a durable activity: per-attempt timeout, bounded
/// retries for retryable failures, immediate propagation otherwise.
pub async fn run_activity(
    stage: Stage,
    state: &mut OrderState,
    env: &FulfilmentEnv,
    policy: &RetryPolicy,
) -> Result<StageOutcome, FulfilmentError> {
    let mut attempt = 1u32;
    loop {
        let result = tokio::time::timeout(START_TO_CLOSE_TIMEOUT, run_stage(stage, state, env))
            .await
            .unwrap_or(Err(FulfilmentError::ActivityTimeout { stage }));

        match result {
            Ok(outcome) => return Ok(outcome),
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                tracing::warn!(
                    order_id = %state.order_id(),
                    stage = %stage,
                    attempt,
                    %error,
                    "activity attempt failed, retrying"
                );
                metrics::counter!("workflow_activity_retries_total").increment(1);
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(error) => {
                tracing::error!(
                    order_id = %state.order_id(),
                    stage = %stage,
                    attempt,
                    %error,
                    "activity failed terminally"
                );
                return Err(error);
            }
        }
    }
}
