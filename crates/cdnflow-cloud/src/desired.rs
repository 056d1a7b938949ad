//! Caller-supplied target shape of a distribution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired configuration for create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredConfig {
    #[serde(default)]
    pub backend: Option<BackendConfig>,

    #[serde(default)]
    pub regions: Option<Vec<String>>,

    #[serde(default)]
    pub blocked_countries: Option<Vec<String>>,

    #[serde(default)]
    pub optimizer: Option<OptimizerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub backend_type: BackendType,

    #[serde(default)]
    pub origin_url: Option<String>,

    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub geofencing: Option<Vec<GeofencingRule>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// HTTP(S) origin server
    Origin,
    /// Object storage bucket
    Bucket,
}

impl BackendType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            BackendType::Origin => "ORIGIN",
            BackendType::Bucket => "BUCKET",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeofencingRule {
    pub action: GeofencingAction,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofencingAction {
    Allow,
    Deny,
}

impl GeofencingAction {
    pub fn as_wire(&self) -> &'static str {
        match self {
            GeofencingAction::Allow => "ALLOW",
            GeofencingAction::Deny => "DENY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    pub enabled: bool,
}
