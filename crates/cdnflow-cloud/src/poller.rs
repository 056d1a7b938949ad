//! Status convergence polling
//!
//! Reads the distribution until its status satisfies the target predicate,
//! the remote reports ERROR, or the operation context fires. Both the
//! in-flight read and the sleep between reads are interruptible.

use crate::context::{Interrupt, OperationContext};
use crate::error::{CloudError, Result};
use crate::id::DistributionId;
use crate::mapper::decode_status;
use crate::model::{Distribution, DistributionStatus};
use crate::provider::{DistributionClient, PollConfig};

/// Target predicate for create and update convergence
pub fn is_active(status: &DistributionStatus) -> bool {
    *status == DistributionStatus::Active
}

/// Poll `id` until `target` holds for its status
///
/// Read failures are transient and retried until the context fires; the
/// timeout error then carries the last observed failure or status.
pub async fn wait_for_status<P>(
    client: &dyn DistributionClient,
    id: &DistributionId,
    target: P,
    config: &PollConfig,
    ctx: &OperationContext,
) -> Result<Distribution>
where
    P: Fn(&DistributionStatus) -> bool,
{
    let mut last_observed: Option<String> = None;
    let mut attempt: u32 = 0;

    loop {
        let outcome = match ctx.run(client.get(id)).await {
            Ok(outcome) => outcome,
            Err(reason) => return Err(interrupted(id, reason, last_observed)),
        };

        match outcome {
            Ok(dist) => match dist.status.as_deref().map(decode_status) {
                Some(status) if target(&status) => {
                    tracing::info!("Distribution {} reached {}", id, status);
                    return Ok(dist);
                }
                Some(status) if status.is_terminal() => {
                    let mut errors = dist.errors.unwrap_or_default();
                    if errors.is_empty() {
                        errors.push(format!("distribution settled in status {}", status));
                    }
                    return Err(CloudError::ConvergenceFailed {
                        id: id.combined(),
                        errors,
                    });
                }
                Some(status) => {
                    tracing::debug!(
                        "Distribution {} is {} (attempt {})",
                        id,
                        status,
                        attempt + 1
                    );
                    last_observed = Some(format!("status {}", status));
                }
                None => {
                    tracing::debug!("Distribution {} reported no status", id);
                    last_observed = Some("no status reported".to_string());
                }
            },
            Err(e) => {
                tracing::warn!("Transient error polling distribution {}: {}", id, e);
                last_observed = Some(e.to_string());
            }
        }

        let delay = config.delay_for_attempt(attempt);
        if let Err(reason) = ctx.run(tokio::time::sleep(delay)).await {
            return Err(interrupted(id, reason, last_observed));
        }
        attempt = attempt.saturating_add(1);
    }
}

/// Timeout error for an operation context that fired while waiting on `id`
pub(crate) fn interrupted(
    id: &DistributionId,
    reason: Interrupt,
    last_observed: Option<String>,
) -> CloudError {
    tracing::warn!("Stopped waiting for distribution {}: {}", id, reason);
    CloudError::Timeout {
        id: id.combined(),
        reason: reason.to_string(),
        last_observed,
    }
}
