//! Diagnostics reported back to the invoking host

use crate::error::CloudError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single structured entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Short, stable description of what went wrong
    pub summary: String,

    /// Underlying cause
    pub detail: String,
}

/// Ordered list of diagnostics produced by one operation
///
/// Any error entry means the host treats the operation as failed,
/// regardless of what was persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    /// Record a failed step, keeping timeouts distinguishable by summary
    pub fn add_cloud_error(&mut self, summary: impl Into<String>, err: &CloudError) {
        let summary = summary.into();
        let summary = if err.is_timeout() {
            format!("{} (timed out)", summary)
        } else {
            summary
        };
        self.add_error(summary, err.to_string());
    }

    pub fn has_error(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.summary, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail_the_operation() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_error());

        diags.add_warning("Distribution removed", "not found remotely");
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);

        diags.add_error("Error creating distribution", "HTTP 500");
        assert!(diags.has_error());
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_timeout_summary_is_labeled() {
        let mut diags = Diagnostics::new();
        diags.add_cloud_error(
            "Error waiting for distribution",
            &CloudError::Timeout {
                id: "p,d".to_string(),
                reason: "deadline exceeded".to_string(),
                last_observed: None,
            },
        );

        let entry = diags.errors().next().unwrap();
        assert_eq!(entry.summary, "Error waiting for distribution (timed out)");
    }
}
