//! Wire representation of a CDN distribution
//!
//! These types mirror the JSON bodies exchanged with the remote service.
//! Every nested object is optional on the wire; the mapper keeps that
//! distinction when building persisted state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a distribution
///
/// Decoded from an open string space. Values this crate does not know are
/// kept verbatim in [`DistributionStatus::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistributionStatus {
    Creating,
    Active,
    Updating,
    Error,
    Deleting,
    Unrecognized(String),
}

impl DistributionStatus {
    /// ACTIVE and ERROR do not self-transition without a mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DistributionStatus::Active | DistributionStatus::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DistributionStatus::Creating => "CREATING",
            DistributionStatus::Active => "ACTIVE",
            DistributionStatus::Updating => "UPDATING",
            DistributionStatus::Error => "ERROR",
            DistributionStatus::Deleting => "DELETING",
            DistributionStatus::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for DistributionStatus {
    fn from(raw: String) -> Self {
        crate::mapper::decode_status(&raw)
    }
}

impl From<DistributionStatus> for String {
    fn from(status: DistributionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionStatus::Unrecognized(raw) if raw.is_empty() => {
                write!(f, "UNRECOGNIZED(<empty>)")
            }
            DistributionStatus::Unrecognized(raw) => write!(f, "UNRECOGNIZED({})", raw),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Full distribution as returned by `GET`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Raw status string, decoded by the mapper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<WireConfig>,
}

/// Body returned by a successful create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedDistribution {
    pub id: String,

    #[serde(default)]
    pub status: Option<String>,
}

/// Body of create and update calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionRequest {
    pub config: WireConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<WireBackend>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_countries: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<WireOptimizer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBackend {
    #[serde(rename = "type")]
    pub backend_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geofencing: Option<Vec<WireGeofencingRule>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireGeofencingRule {
    pub action: String,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireOptimizer {
    pub enabled: bool,
}
