//! cdnflow distribution lifecycle
//!
//! This crate manages the lifecycle of a CDN distribution whose creation is
//! asynchronous: the create call returns an id right away, and the
//! distribution becomes usable only once the service reports it ACTIVE.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   cdnflow CLI                    │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 cdnflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        DistributionController             │   │
//! │  │   create / read / update / delete         │   │
//! │  └──────┬──────────────┬──────────────┬──────┘   │
//! │  ┌──────▼─────┐ ┌──────▼─────┐ ┌──────▼─────┐   │
//! │  │   Poller   │ │   Mapper   │ │   State    │   │
//! │  └──────┬─────┘ └────────────┘ └────────────┘   │
//! └─────────┼───────────────────────────────────────┘
//!           │ trait DistributionClient
//! ┌─────────▼───────┐
//! │ cdnflow-cloud-  │
//! │      api        │
//! └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cdnflow_cloud::{DistributionController, MemoryStateStore, OperationContext};
//!
//! let controller = DistributionController::new(client);
//! let state = MemoryStateStore::new();
//! let ctx = OperationContext::with_timeout(Duration::from_secs(1200));
//!
//! let diags = controller.create("my-project", &desired, &ctx, &state).await;
//! if diags.has_error() {
//!     // the id, if one was assigned, is already in `state`
//! }
//! ```

pub mod context;
pub mod controller;
pub mod desired;
pub mod diagnostics;
pub mod error;
pub mod id;
pub mod mapper;
pub mod model;
pub mod poller;
pub mod provider;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use context::{Interrupt, OperationContext};
pub use controller::DistributionController;
pub use desired::{
    BackendConfig, BackendType, DesiredConfig, GeofencingAction, GeofencingRule, OptimizerConfig,
};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CloudError, Result};
pub use id::DistributionId;
pub use model::{
    CreatedDistribution, Distribution, DistributionRequest, DistributionStatus, WireBackend,
    WireConfig, WireGeofencingRule, WireOptimizer,
};
pub use provider::{DistributionClient, PollConfig};
pub use state::{
    BackendState, ConfigState, DistributionState, FileStateSlot, GeofencingState, GlobalState,
    MemoryStateStore, OptimizerState, StateLock, StateManager, StatePersister,
};
