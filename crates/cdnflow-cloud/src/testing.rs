//! Scripted in-memory [`DistributionClient`] for tests
//!
//! Each call kind pops its next scripted reply; the last reply of a queue
//! repeats forever. Every call is recorded.

use crate::error::{CloudError, Result};
use crate::id::DistributionId;
use crate::model::{CreatedDistribution, Distribution, DistributionRequest};
use crate::provider::DistributionClient;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Failure a scripted call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Api(u16),
    Transport,
}

impl Failure {
    fn into_error(self, what: &str) -> CloudError {
        match self {
            Failure::NotFound => CloudError::NotFound(what.to_string()),
            Failure::Api(status) => CloudError::Api {
                status,
                message: format!("scripted failure for {}", what),
            },
            Failure::Transport => {
                CloudError::Transport(format!("scripted connection reset for {}", what))
            }
        }
    }
}

/// Recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(String, DistributionRequest),
    Get(DistributionId),
    Update(DistributionId, DistributionRequest),
    Delete(DistributionId),
}

/// Scripted reply of a `get`, optionally delayed
#[derive(Debug, Clone)]
pub struct GetStep {
    delay: Duration,
    reply: std::result::Result<Distribution, Failure>,
}

impl GetStep {
    pub fn reply(dist: Distribution) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Ok(dist),
        }
    }

    pub fn fail(failure: Failure) -> Self {
        Self {
            delay: Duration::ZERO,
            reply: Err(failure),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub struct ScriptedClient {
    creates: Mutex<VecDeque<std::result::Result<CreatedDistribution, Failure>>>,
    gets: Mutex<VecDeque<GetStep>>,
    updates: Mutex<VecDeque<std::result::Result<(), Failure>>>,
    deletes: Mutex<VecDeque<std::result::Result<(), Failure>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(self, reply: std::result::Result<CreatedDistribution, Failure>) -> Self {
        lock(&self.creates).push_back(reply);
        self
    }

    pub fn on_get(self, step: GetStep) -> Self {
        lock(&self.gets).push_back(step);
        self
    }

    pub fn on_update(self, reply: std::result::Result<(), Failure>) -> Self {
        lock(&self.updates).push_back(reply);
        self
    }

    pub fn on_delete(self, reply: std::result::Result<(), Failure>) -> Self {
        lock(&self.deletes).push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = lock(queue);
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl DistributionClient for ScriptedClient {
    async fn create(
        &self,
        project: &str,
        request: &DistributionRequest,
    ) -> Result<CreatedDistribution> {
        self.record(Call::Create(project.to_string(), request.clone()));
        next(&self.creates)
            .unwrap_or(Err(Failure::Transport))
            .map_err(|f| f.into_error(project))
    }

    async fn get(&self, id: &DistributionId) -> Result<Distribution> {
        self.record(Call::Get(id.clone()));
        let step = next(&self.gets).unwrap_or_else(|| GetStep::fail(Failure::Transport));
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.reply.map_err(|f| f.into_error(&id.combined()))
    }

    async fn update(&self, id: &DistributionId, request: &DistributionRequest) -> Result<()> {
        self.record(Call::Update(id.clone(), request.clone()));
        next(&self.updates)
            .unwrap_or(Err(Failure::Transport))
            .map_err(|f| f.into_error(&id.combined()))
    }

    async fn delete(&self, id: &DistributionId) -> Result<()> {
        self.record(Call::Delete(id.clone()));
        next(&self.deletes)
            .unwrap_or(Err(Failure::Transport))
            .map_err(|f| f.into_error(&id.combined()))
    }
}

/// Create-call reply carrying `id` in CREATING status
pub fn created(id: &str) -> CreatedDistribution {
    CreatedDistribution {
        id: id.to_string(),
        status: Some("CREATING".to_string()),
    }
}

/// Minimal remote representation with `status`
pub fn distribution(id: &str, status: &str) -> Distribution {
    Distribution {
        id: id.to_string(),
        status: Some(status.to_string()),
        ..Default::default()
    }
}
