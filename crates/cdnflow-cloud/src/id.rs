//! Distribution identifiers

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const SEPARATOR: char = ',';

/// Composite key of a distribution: project scope plus the id the remote
/// service assigned at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistributionId {
    pub project: String,
    pub distribution: String,
}

impl DistributionId {
    pub fn new(project: impl Into<String>, distribution: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            distribution: distribution.into(),
        }
    }

    /// Opaque combined id, `"<project>,<distribution>"`
    pub fn combined(&self) -> String {
        format!("{}{}{}", self.project, SEPARATOR, self.distribution)
    }

    /// Parse a combined id produced by [`DistributionId::combined`].
    pub fn parse(combined: &str) -> Result<Self> {
        let (project, distribution) = combined
            .split_once(SEPARATOR)
            .ok_or_else(|| CloudError::InvalidId(combined.to_string()))?;

        let project = project.trim();
        let distribution = distribution.trim();
        if project.is_empty() || distribution.is_empty() || distribution.contains(SEPARATOR) {
            return Err(CloudError::InvalidId(combined.to_string()));
        }

        Ok(Self::new(project, distribution))
    }
}

impl fmt::Display for DistributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.combined())
    }
}
