//! REST client for the CDN distribution API
//!
//! Implements [`cdnflow_cloud::DistributionClient`] over HTTPS with bearer
//! token authentication.
//!
//! # Requirements
//!
//! - `CDN_API_TOKEN` env var (and optionally `CDN_API_URL`)
//!
//! # Example
//!
//! ```ignore
//! use cdnflow_cloud_api::{ApiConfig, CdnApiClient};
//! use cdnflow_cloud::DistributionController;
//!
//! let client = CdnApiClient::new(ApiConfig::from_env()?)?;
//! let controller = DistributionController::new(Arc::new(client));
//! ```

pub mod client;
pub mod error;

pub use client::{ApiConfig, CdnApiClient, DEFAULT_API_BASE};
pub use error::{ApiError, Result};
