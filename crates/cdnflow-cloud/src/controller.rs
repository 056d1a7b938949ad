//! Distribution lifecycle controller
//!
//! Drives create, read, update, delete and import as short sequential
//! pipelines over a [`DistributionClient`] and a [`StatePersister`], and
//! reports the outcome as [`Diagnostics`].
//!
//! Ordering rules:
//!
//! - create commits the identifier (the anchor) right after the create call
//!   succeeds and before anything else runs; later failures never roll it back
//! - the full state is committed only after convergence succeeds
//! - a failed mutation or an inconclusive read leaves persisted state as it was
//! - state is cleared only on a successful delete or a not-found read
//! - create and import never replace an identifier that is already tracked
//!
//! Concurrent operations on the same identifier are not coordinated here;
//! the host is expected to run one operation per distribution at a time.

use crate::context::OperationContext;
use crate::desired::DesiredConfig;
use crate::diagnostics::Diagnostics;
use crate::id::DistributionId;
use crate::mapper;
use crate::poller::{self, is_active};
use crate::provider::{DistributionClient, PollConfig};
use crate::state::{DistributionState, StatePersister};
use std::sync::Arc;

pub struct DistributionController {
    client: Arc<dyn DistributionClient>,
    poll: PollConfig,
}

impl DistributionController {
    pub fn new(client: Arc<dyn DistributionClient>) -> Self {
        Self {
            client,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Create a distribution in `project` and wait for it to become ACTIVE
    pub async fn create(
        &self,
        project: &str,
        desired: &DesiredConfig,
        ctx: &OperationContext,
        state: &dyn StatePersister,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let request = match mapper::to_request(desired) {
            Ok(request) => request,
            Err(e) => {
                diags.add_cloud_error("Invalid distribution configuration", &e);
                return diags;
            }
        };

        match tracked_id(state).await {
            Ok(None) => {}
            Ok(Some(existing)) => {
                diags.add_error(
                    "Distribution already tracked",
                    format!(
                        "state already tracks distribution {}; update or delete it instead of creating another",
                        existing
                    ),
                );
                return diags;
            }
            Err(e) => {
                diags.add_cloud_error("Error reading state", &e);
                return diags;
            }
        }

        // Not raced against ctx: dropping an in-flight create could leave a
        // distribution behind whose id was never seen.
        let created = match self.client.create(project, &request).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!("Create call for project {} failed: {}", project, e);
                diags.add_cloud_error("Error creating distribution", &e);
                return diags;
            }
        };

        if created.id.trim().is_empty() {
            diags.add_error(
                "Error creating distribution",
                "the service accepted the request but returned an empty distribution id",
            );
            return diags;
        }

        let id = DistributionId::new(project, created.id);
        if let Err(e) = state.commit(&DistributionState::anchor(&id)).await {
            tracing::error!("Distribution {} was created but its id was not saved: {}", id, e);
            diags.add_error(
                "Error saving distribution id",
                format!(
                    "distribution {} exists remotely but could not be recorded: {}",
                    id, e
                ),
            );
            return diags;
        }
        tracing::info!(
            "Created distribution {} ({}), waiting for ACTIVE",
            id,
            created.status.as_deref().unwrap_or("no status")
        );

        self.converge(&id, ctx, state, "creation", &mut diags).await;
        diags
    }

    /// Refresh persisted state from the remote representation
    pub async fn read(&self, ctx: &OperationContext, state: &dyn StatePersister) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let current = match state.read().await {
            Ok(Some(current)) => current,
            Ok(None) => {
                tracing::debug!("No distribution in state, nothing to read");
                return diags;
            }
            Err(e) => {
                diags.add_cloud_error("Error reading state", &e);
                return diags;
            }
        };
        let Some(id) = current.distribution_id() else {
            diags.add_error(
                "Error reading distribution",
                "persisted state has no distribution id",
            );
            return diags;
        };

        let fetched = match ctx.run(self.client.get(&id)).await {
            Ok(fetched) => fetched,
            Err(reason) => {
                let e = poller::interrupted(&id, reason, None);
                diags.add_cloud_error("Error reading distribution", &e);
                return diags;
            }
        };

        match fetched {
            Ok(dist) => {
                if let Err(e) = state.commit(&mapper::to_state(&id, &dist)).await {
                    diags.add_cloud_error("Error saving distribution state", &e);
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Distribution {} no longer exists, removing from state", id);
                match state.clear().await {
                    Ok(()) => diags.add_warning(
                        "Distribution not found",
                        format!("distribution {} was removed from state", id),
                    ),
                    Err(e) => diags.add_cloud_error("Error removing distribution from state", &e),
                }
            }
            Err(e) => {
                tracing::error!("Reading distribution {} failed: {}", id, e);
                diags.add_cloud_error("Error reading distribution", &e);
            }
        }

        diags
    }

    /// Apply a new desired configuration and wait for ACTIVE again
    pub async fn update(
        &self,
        desired: &DesiredConfig,
        ctx: &OperationContext,
        state: &dyn StatePersister,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let prior = match state.read().await {
            Ok(prior) => prior,
            Err(e) => {
                diags.add_cloud_error("Error reading state", &e);
                return diags;
            }
        };
        let Some((prior, id)) = prior.and_then(|p| p.distribution_id().map(|id| (p, id))) else {
            diags.add_error(
                "Error updating distribution",
                "no distribution id in state; create or import it first",
            );
            return diags;
        };

        let request = match mapper::to_request(desired) {
            Ok(request) => request,
            Err(e) => {
                diags.add_cloud_error("Invalid distribution configuration", &e);
                return diags;
            }
        };

        if prior.config.as_ref().map(mapper::wire_config) == Some(request.config.clone()) {
            tracing::debug!("Configuration of {} is unchanged, updating anyway", id);
        }

        if let Err(e) = self.client.update(&id, &request).await {
            tracing::error!("Update call for distribution {} failed: {}", id, e);
            diags.add_cloud_error("Error updating distribution", &e);
            return diags;
        }
        tracing::info!("Updated distribution {}, waiting for ACTIVE", id);

        self.converge(&id, ctx, state, "update", &mut diags).await;
        diags
    }

    /// Delete the distribution; a distribution that is already gone counts
    /// as deleted
    pub async fn delete(&self, state: &dyn StatePersister) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let current = match state.read().await {
            Ok(Some(current)) => current,
            Ok(None) => {
                tracing::debug!("No distribution in state, nothing to delete");
                return diags;
            }
            Err(e) => {
                diags.add_cloud_error("Error reading state", &e);
                return diags;
            }
        };
        let Some(id) = current.distribution_id() else {
            diags.add_error(
                "Error deleting distribution",
                "persisted state has no distribution id",
            );
            return diags;
        };

        match self.client.delete(&id).await {
            Ok(()) => tracing::info!("Deleted distribution {}", id),
            Err(e) if e.is_not_found() => {
                tracing::info!("Distribution {} already deleted", id);
            }
            Err(e) => {
                tracing::error!("Delete call for distribution {} failed: {}", id, e);
                diags.add_cloud_error("Error deleting distribution", &e);
                return diags;
            }
        }

        if let Err(e) = state.clear().await {
            diags.add_cloud_error("Error removing distribution from state", &e);
        }
        diags
    }

    /// Start tracking an existing distribution by its combined id
    pub async fn import(
        &self,
        combined_id: &str,
        ctx: &OperationContext,
        state: &dyn StatePersister,
    ) -> Diagnostics {
        let id = match DistributionId::parse(combined_id) {
            Ok(id) => id,
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_cloud_error("Invalid import id", &e);
                return diags;
            }
        };

        // Re-importing the tracked id is a refresh; any other id would drop it
        match tracked_id(state).await {
            Ok(Some(existing)) if existing != id => {
                let mut diags = Diagnostics::new();
                diags.add_error(
                    "Distribution already tracked",
                    format!(
                        "state already tracks distribution {}; delete it before importing {}",
                        existing, id
                    ),
                );
                return diags;
            }
            Ok(_) => {}
            Err(e) => {
                let mut diags = Diagnostics::new();
                diags.add_cloud_error("Error reading state", &e);
                return diags;
            }
        }

        if let Err(e) = state.commit(&DistributionState::anchor(&id)).await {
            let mut diags = Diagnostics::new();
            diags.add_cloud_error("Error saving distribution id", &e);
            return diags;
        }

        let mut diags = self.read(ctx, state).await;
        if !diags.has_error() && matches!(state.read().await, Ok(None)) {
            diags.add_error(
                "Cannot import distribution",
                format!("distribution {} does not exist", id),
            );
        }
        diags
    }

    /// Wait for ACTIVE and commit the final state; on failure the persisted
    /// state is left untouched
    async fn converge(
        &self,
        id: &DistributionId,
        ctx: &OperationContext,
        state: &dyn StatePersister,
        phase: &str,
        diags: &mut Diagnostics,
    ) {
        match poller::wait_for_status(self.client.as_ref(), id, is_active, &self.poll, ctx).await {
            Ok(dist) => {
                if let Err(e) = state.commit(&mapper::to_state(id, &dist)).await {
                    diags.add_cloud_error("Error saving distribution state", &e);
                }
            }
            Err(e) => {
                tracing::error!("Distribution {} did not converge after {}: {}", id, phase, e);
                diags.add_cloud_error(
                    format!("Error waiting for distribution {} to complete", phase),
                    &e,
                );
            }
        }
    }
}

/// Identifier already anchored in `state`, if any
async fn tracked_id(state: &dyn StatePersister) -> crate::error::Result<Option<DistributionId>> {
    Ok(state
        .read()
        .await?
        .and_then(|current| current.distribution_id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DistributionStatus;
    use crate::state::MemoryStateStore;
    use crate::testing::{Call, Failure, GetStep, ScriptedClient, created, distribution};
    use std::time::Duration;

    fn fast_poll() -> PollConfig {
        PollConfig {
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(10),
            backoff_multiplier: 1.0,
        }
    }

    fn controller(client: ScriptedClient) -> (Arc<ScriptedClient>, DistributionController) {
        let client = Arc::new(client);
        let controller =
            DistributionController::new(client.clone()).with_poll_config(fast_poll());
        (client, controller)
    }

    fn active_state() -> DistributionState {
        DistributionState {
            status: Some(DistributionStatus::Active),
            domains: Some(vec!["a.cdn.example.net".to_string()]),
            ..DistributionState::anchor(&DistributionId::new("proj", "dist-1"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_commits_anchor_then_full_state() {
        let (_, controller) = controller(
            ScriptedClient::new()
                .on_create(Ok(created("dist-1")))
                .on_get(GetStep::reply(distribution("dist-1", "CREATING")))
                .on_get(GetStep::reply(distribution("dist-1", "ACTIVE"))),
        );
        let store = MemoryStateStore::new();
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));

        let diags = controller
            .create("proj", &DesiredConfig::default(), &ctx, &store)
            .await;

        assert!(!diags.has_error(), "{:?}", diags);
        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0],
            DistributionState::anchor(&DistributionId::new("proj", "dist-1"))
        );
        assert_eq!(history[1].status, Some(DistributionStatus::Active));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_anchor_survives_cancellation() {
        let (_, controller) = controller(
            ScriptedClient::new()
                .on_create(Ok(created("dist-1")))
                .on_get(GetStep::reply(distribution("dist-1", "CREATING"))),
        );
        let store = MemoryStateStore::new();
        let ctx = OperationContext::new();
        let token = ctx.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(35)).await;
            token.cancel();
        });

        let diags = controller
            .create("proj", &DesiredConfig::default(), &ctx, &store)
            .await;

        assert!(diags.has_error());
        assert!(diags.errors().next().unwrap().summary.contains("timed out"));
        let state = store.read().await.unwrap().unwrap();
        assert_eq!(state.id.as_deref(), Some("dist-1"));
        assert!(state.status.is_none());
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_persists_nothing() {
        let (client, controller) =
            controller(ScriptedClient::new().on_create(Err(Failure::Api(500))));
        let store = MemoryStateStore::new();

        let diags = controller
            .create("proj", &DesiredConfig::default(), &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert!(store.read().await.unwrap().is_none());
        assert!(store.history().is_empty());
        assert_eq!(client.count(|c| matches!(c, Call::Get(_))), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config_before_calling_remote() {
        let (client, controller) = controller(ScriptedClient::new());
        let store = MemoryStateStore::new();
        let desired = DesiredConfig {
            blocked_countries: Some(vec!["not-a-country".to_string()]),
            ..Default::default()
        };

        let diags = controller
            .create("proj", &desired, &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert!(client.calls().is_empty());
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_error_status_keeps_anchor() {
        let mut failed = distribution("dist-1", "ERROR");
        failed.errors = Some(vec!["certificate provisioning failed".to_string()]);
        let (_, controller) = controller(
            ScriptedClient::new()
                .on_create(Ok(created("dist-1")))
                .on_get(GetStep::reply(failed)),
        );
        let store = MemoryStateStore::new();
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));

        let diags = controller
            .create("proj", &DesiredConfig::default(), &ctx, &store)
            .await;

        let error = diags.errors().next().unwrap();
        assert!(!error.summary.contains("timed out"));
        assert!(error.detail.contains("certificate provisioning failed"));
        assert_eq!(
            store.read().await.unwrap(),
            Some(DistributionState::anchor(&DistributionId::new("proj", "dist-1")))
        );
    }

    #[tokio::test]
    async fn test_create_refuses_to_replace_tracked_id() {
        let (client, controller) =
            controller(ScriptedClient::new().on_create(Ok(created("dist-new"))));
        let tracked = DistributionState::anchor(&DistributionId::new("proj", "dist-old"));
        let store = MemoryStateStore::with_state(tracked.clone());
        let ctx = OperationContext::with_timeout(Duration::from_millis(100));

        let diags = controller
            .create("proj", &DesiredConfig::default(), &ctx, &store)
            .await;

        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Distribution already tracked");
        assert!(error.detail.contains("proj,dist-old"));
        assert!(client.calls().is_empty());
        assert_eq!(store.read().await.unwrap(), Some(tracked));
    }

    #[tokio::test]
    async fn test_create_over_state_without_id_proceeds() {
        let (client, controller) = controller(
            ScriptedClient::new()
                .on_create(Ok(created("dist-1")))
                .on_get(GetStep::reply(distribution("dist-1", "ACTIVE"))),
        );
        let store = MemoryStateStore::with_state(DistributionState::default());
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));

        let diags = controller
            .create("proj", &DesiredConfig::default(), &ctx, &store)
            .await;

        assert!(!diags.has_error(), "{:?}", diags);
        assert_eq!(client.count(|c| matches!(c, Call::Create(..))), 1);
        let state = store.read().await.unwrap().unwrap();
        assert_eq!(state.combined_id.as_deref(), Some("proj,dist-1"));
    }

    #[tokio::test]
    async fn test_read_not_found_clears_state() {
        let (_, controller) =
            controller(ScriptedClient::new().on_get(GetStep::fail(Failure::NotFound)));
        let store = MemoryStateStore::with_state(active_state());

        let diags = controller.read(&OperationContext::new(), &store).await;

        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_failure_keeps_state() {
        let (_, controller) =
            controller(ScriptedClient::new().on_get(GetStep::fail(Failure::Api(503))));
        let store = MemoryStateStore::with_state(active_state());

        let diags = controller.read(&OperationContext::new(), &store).await;

        assert!(diags.has_error());
        assert_eq!(store.read().await.unwrap(), Some(active_state()));
    }

    #[tokio::test]
    async fn test_read_refreshes_state() {
        let mut remote = distribution("dist-1", "UPDATING");
        remote.domains = Some(vec!["b.cdn.example.net".to_string()]);
        let (_, controller) = controller(ScriptedClient::new().on_get(GetStep::reply(remote)));
        let store = MemoryStateStore::with_state(active_state());

        let diags = controller.read(&OperationContext::new(), &store).await;

        assert!(diags.is_empty());
        let state = store.read().await.unwrap().unwrap();
        assert_eq!(state.status, Some(DistributionStatus::Updating));
        assert_eq!(state.domains, Some(vec!["b.cdn.example.net".to_string()]));
    }

    #[tokio::test]
    async fn test_update_failure_preserves_state() {
        let (client, controller) =
            controller(ScriptedClient::new().on_update(Err(Failure::Api(409))));
        let store = MemoryStateStore::with_state(active_state());

        let diags = controller
            .update(&DesiredConfig::default(), &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert_eq!(store.read().await.unwrap(), Some(active_state()));
        assert!(store.history().is_empty());
        assert_eq!(client.count(|c| matches!(c, Call::Get(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_converges_and_commits() {
        let mut remote = distribution("dist-1", "ACTIVE");
        remote.config = Some(crate::model::WireConfig {
            regions: Some(vec!["EU".to_string()]),
            ..Default::default()
        });
        let (client, controller) = controller(
            ScriptedClient::new()
                .on_update(Ok(()))
                .on_get(GetStep::reply(distribution("dist-1", "UPDATING")))
                .on_get(GetStep::reply(remote)),
        );
        let store = MemoryStateStore::with_state(active_state());
        let desired = DesiredConfig {
            regions: Some(vec!["EU".to_string()]),
            ..Default::default()
        };
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));

        let diags = controller.update(&desired, &ctx, &store).await;

        assert!(!diags.has_error(), "{:?}", diags);
        assert_eq!(store.history().len(), 1);
        let state = store.read().await.unwrap().unwrap();
        assert_eq!(
            state.config.unwrap().regions,
            Some(vec!["EU".to_string()])
        );
        assert!(matches!(
            &client.calls()[0],
            Call::Update(id, _) if id.combined() == "proj,dist-1"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_timeout_preserves_state() {
        let (_, controller) = controller(
            ScriptedClient::new()
                .on_update(Ok(()))
                .on_get(GetStep::reply(distribution("dist-1", "UPDATING"))),
        );
        let store = MemoryStateStore::with_state(active_state());
        let ctx = OperationContext::with_timeout(Duration::from_millis(100));

        let diags = controller
            .update(&DesiredConfig::default(), &ctx, &store)
            .await;

        assert!(diags.has_error());
        assert_eq!(store.read().await.unwrap(), Some(active_state()));
    }

    #[tokio::test]
    async fn test_update_without_state_fails() {
        let (client, controller) = controller(ScriptedClient::new());
        let store = MemoryStateStore::new();

        let diags = controller
            .update(&DesiredConfig::default(), &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (client, controller) =
            controller(ScriptedClient::new().on_delete(Err(Failure::NotFound)));
        let store = MemoryStateStore::with_state(active_state());

        let first = controller.delete(&store).await;
        assert!(!first.has_error());
        assert!(store.read().await.unwrap().is_none());

        let second = controller.delete(&store).await;
        assert!(second.is_empty());
        assert!(store.read().await.unwrap().is_none());
        assert_eq!(client.count(|c| matches!(c, Call::Delete(_))), 1);
    }

    #[tokio::test]
    async fn test_delete_not_found_clears_reseeded_state() {
        let (client, controller) =
            controller(ScriptedClient::new().on_delete(Err(Failure::NotFound)));
        let store = MemoryStateStore::with_state(active_state());

        assert!(!controller.delete(&store).await.has_error());
        store.commit(&active_state()).await.unwrap();
        assert!(!controller.delete(&store).await.has_error());

        assert!(store.read().await.unwrap().is_none());
        assert_eq!(client.count(|c| matches!(c, Call::Delete(_))), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_state() {
        let (_, controller) =
            controller(ScriptedClient::new().on_delete(Err(Failure::Api(500))));
        let store = MemoryStateStore::with_state(active_state());

        let diags = controller.delete(&store).await;

        assert!(diags.has_error());
        assert_eq!(store.read().await.unwrap(), Some(active_state()));
    }

    #[tokio::test]
    async fn test_delete_without_state_is_noop() {
        let (client, controller) = controller(ScriptedClient::new());
        let store = MemoryStateStore::new();

        let diags = controller.delete(&store).await;

        assert!(diags.is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_import_tracks_existing_distribution() {
        let (_, controller) = controller(
            ScriptedClient::new().on_get(GetStep::reply(distribution("dist-9", "ACTIVE"))),
        );
        let store = MemoryStateStore::new();

        let diags = controller
            .import("proj,dist-9", &OperationContext::new(), &store)
            .await;

        assert!(diags.is_empty(), "{:?}", diags);
        let state = store.read().await.unwrap().unwrap();
        assert_eq!(state.combined_id.as_deref(), Some("proj,dist-9"));
        assert_eq!(state.status, Some(DistributionStatus::Active));
    }

    #[tokio::test]
    async fn test_import_missing_distribution_fails() {
        let (_, controller) =
            controller(ScriptedClient::new().on_get(GetStep::fail(Failure::NotFound)));
        let store = MemoryStateStore::new();

        let diags = controller
            .import("proj,dist-9", &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_refuses_to_replace_tracked_id() {
        let (client, controller) = controller(
            ScriptedClient::new().on_get(GetStep::reply(distribution("dist-x", "ACTIVE"))),
        );
        let tracked = DistributionState::anchor(&DistributionId::new("proj", "dist-old"));
        let store = MemoryStateStore::with_state(tracked.clone());

        let diags = controller
            .import("proj,dist-x", &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert!(client.calls().is_empty());
        assert!(store.history().is_empty());
        assert_eq!(store.read().await.unwrap(), Some(tracked));
    }

    #[tokio::test]
    async fn test_import_of_tracked_id_refreshes() {
        let (_, controller) = controller(
            ScriptedClient::new().on_get(GetStep::reply(distribution("dist-1", "ACTIVE"))),
        );
        let store = MemoryStateStore::with_state(DistributionState::anchor(
            &DistributionId::new("proj", "dist-1"),
        ));

        let diags = controller
            .import("proj,dist-1", &OperationContext::new(), &store)
            .await;

        assert!(diags.is_empty(), "{:?}", diags);
        let state = store.read().await.unwrap().unwrap();
        assert_eq!(state.status, Some(DistributionStatus::Active));
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_id() {
        let (client, controller) = controller(ScriptedClient::new());
        let store = MemoryStateStore::new();

        let diags = controller
            .import("dist-9", &OperationContext::new(), &store)
            .await;

        assert!(diags.has_error());
        assert!(client.calls().is_empty());
        assert!(store.history().is_empty());
    }
}
