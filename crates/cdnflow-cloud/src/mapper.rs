//! Translation between the wire representation and persisted state
//!
//! Everything here is pure. Absent nested objects stay `None` in both
//! directions; empty collections stay present-but-empty.

use crate::desired::{BackendConfig, BackendType, DesiredConfig, GeofencingRule};
use crate::error::{CloudError, Result};
use crate::id::DistributionId;
use crate::model::{
    Distribution, DistributionRequest, DistributionStatus, WireBackend, WireConfig,
    WireGeofencingRule, WireOptimizer,
};
use crate::state::{
    BackendState, ConfigState, DistributionState, GeofencingState, OptimizerState,
};
use chrono::{DateTime, SecondsFormat, Utc};

/// Decode a raw status string
///
/// Matching is case-insensitive. Empty strings, `STATUS_UNSPECIFIED` and any
/// value not listed here become [`DistributionStatus::Unrecognized`].
pub fn decode_status(raw: &str) -> DistributionStatus {
    match raw.trim().to_ascii_uppercase().as_str() {
        "CREATING" => DistributionStatus::Creating,
        "ACTIVE" => DistributionStatus::Active,
        "UPDATING" => DistributionStatus::Updating,
        "ERROR" => DistributionStatus::Error,
        "DELETING" => DistributionStatus::Deleting,
        _ => DistributionStatus::Unrecognized(raw.to_string()),
    }
}

/// Canonical textual form of a timestamp: RFC 3339, UTC, second precision
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Validate a desired configuration and build the create/update body
pub fn to_request(desired: &DesiredConfig) -> Result<DistributionRequest> {
    let backend = desired.backend.as_ref().map(backend_request).transpose()?;

    let regions = desired
        .regions
        .as_ref()
        .map(|regions| {
            regions
                .iter()
                .map(|region| {
                    let region = region.trim();
                    if region.is_empty() {
                        Err(CloudError::InvalidConfig(
                            "regions must not contain empty entries".to_string(),
                        ))
                    } else {
                        Ok(region.to_string())
                    }
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    let blocked_countries = desired
        .blocked_countries
        .as_deref()
        .map(country_codes)
        .transpose()?;

    let optimizer = desired.optimizer.map(|optimizer| WireOptimizer {
        enabled: optimizer.enabled,
    });

    Ok(DistributionRequest {
        config: WireConfig {
            backend,
            regions,
            blocked_countries,
            optimizer,
        },
    })
}

fn backend_request(backend: &BackendConfig) -> Result<WireBackend> {
    let origin_url = match backend.origin_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            return Err(CloudError::InvalidConfig(
                "backend.origin_url is required".to_string(),
            ));
        }
    };

    if backend.backend_type == BackendType::Origin
        && !(origin_url.starts_with("https://") || origin_url.starts_with("http://"))
    {
        return Err(CloudError::InvalidConfig(format!(
            "backend.origin_url must be an http(s) URL for origin backends: {}",
            origin_url
        )));
    }

    if let Some(headers) = &backend.headers {
        if headers.keys().any(|name| name.trim().is_empty()) {
            return Err(CloudError::InvalidConfig(
                "backend.headers must not contain empty header names".to_string(),
            ));
        }
    }

    let geofencing = backend
        .geofencing
        .as_ref()
        .map(|rules| rules.iter().map(geofencing_request).collect::<Result<Vec<_>>>())
        .transpose()?;

    Ok(WireBackend {
        backend_type: backend.backend_type.as_wire().to_string(),
        origin_url: Some(origin_url),
        headers: backend.headers.clone(),
        geofencing,
    })
}

fn geofencing_request(rule: &GeofencingRule) -> Result<WireGeofencingRule> {
    if rule.countries.is_empty() {
        return Err(CloudError::InvalidConfig(
            "geofencing rules must list at least one country".to_string(),
        ));
    }

    Ok(WireGeofencingRule {
        action: rule.action.as_wire().to_string(),
        countries: country_codes(&rule.countries)?,
    })
}

/// ISO 3166-1 alpha-2 codes, normalized to upper case
fn country_codes(codes: &[String]) -> Result<Vec<String>> {
    codes
        .iter()
        .map(|code| {
            let code = code.trim();
            if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(code.to_ascii_uppercase())
            } else {
                Err(CloudError::InvalidConfig(format!(
                    "invalid country code '{}': expected two letters",
                    code
                )))
            }
        })
        .collect()
}

/// Map a remote representation to the full persisted state of `id`
pub fn to_state(id: &DistributionId, dist: &Distribution) -> DistributionState {
    if dist.id != id.distribution {
        tracing::warn!(
            "Remote returned distribution {} while {} was requested; keeping the tracked id",
            dist.id,
            id
        );
    }

    DistributionState {
        id: Some(id.distribution.clone()),
        project: Some(id.project.clone()),
        combined_id: Some(id.combined()),
        status: dist.status.as_deref().map(decode_status),
        created_at: dist.created_at.map(format_timestamp),
        updated_at: dist.updated_at.map(format_timestamp),
        errors: dist.errors.clone(),
        domains: dist.domains.clone(),
        config: dist.config.as_ref().map(config_state),
    }
}

/// Wire config echoed by the remote service → persisted config
pub fn config_state(config: &WireConfig) -> ConfigState {
    ConfigState {
        backend: config.backend.as_ref().map(|backend| BackendState {
            backend_type: backend.backend_type.clone(),
            origin_url: backend.origin_url.clone(),
            headers: backend.headers.clone(),
            geofencing: backend.geofencing.as_ref().map(|rules| {
                rules
                    .iter()
                    .map(|rule| GeofencingState {
                        action: rule.action.clone(),
                        countries: rule.countries.clone(),
                    })
                    .collect()
            }),
        }),
        regions: config.regions.clone(),
        blocked_countries: config.blocked_countries.clone(),
        optimizer: config.optimizer.as_ref().map(|optimizer| OptimizerState {
            enabled: optimizer.enabled,
        }),
    }
}

/// Persisted config → wire config
pub fn wire_config(state: &ConfigState) -> WireConfig {
    WireConfig {
        backend: state.backend.as_ref().map(|backend| WireBackend {
            backend_type: backend.backend_type.clone(),
            origin_url: backend.origin_url.clone(),
            headers: backend.headers.clone(),
            geofencing: backend.geofencing.as_ref().map(|rules| {
                rules
                    .iter()
                    .map(|rule| WireGeofencingRule {
                        action: rule.action.clone(),
                        countries: rule.countries.clone(),
                    })
                    .collect()
            }),
        }),
        regions: state.regions.clone(),
        blocked_countries: state.blocked_countries.clone(),
        optimizer: state.optimizer.map(|optimizer| WireOptimizer {
            enabled: optimizer.enabled,
        }),
    }
}
