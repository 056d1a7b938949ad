//! Remote distribution client trait

use crate::error::Result;
use crate::id::DistributionId;
use crate::model::{CreatedDistribution, Distribution, DistributionRequest};
use async_trait::async_trait;
use std::time::Duration;

/// Client for the remote CDN service
///
/// Implementations must report a 404-equivalent on `get` and `delete` as
/// [`CloudError::NotFound`](crate::CloudError::NotFound), distinct from any
/// other failure.
#[async_trait]
pub trait DistributionClient: Send + Sync {
    /// Start creating a distribution; returns once the id is assigned
    async fn create(
        &self,
        project: &str,
        request: &DistributionRequest,
    ) -> Result<CreatedDistribution>;

    /// Fetch the current representation
    async fn get(&self, id: &DistributionId) -> Result<Distribution>;

    /// Start updating a distribution's configuration
    async fn update(&self, id: &DistributionId, request: &DistributionRequest) -> Result<()>;

    /// Start deleting a distribution
    async fn delete(&self, id: &DistributionId) -> Result<()>;
}

/// Interval policy of the status poller
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay after the first poll
    pub initial_interval: Duration,

    /// Upper bound for the delay between polls
    pub max_interval: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl PollConfig {
    /// Delay before poll `attempt + 1`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt.min(32) as i32);
        let secs = self.initial_interval.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            return self.max_interval;
        }
        Duration::from_secs_f64(secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            backoff_multiplier: 1.5,
        }
    }
}
