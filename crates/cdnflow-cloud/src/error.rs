//! Distribution lifecycle error types

use thiserror::Error;

/// Errors raised by distribution clients, state stores and the controller
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Distribution not found: {0}")]
    NotFound(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid distribution id '{0}': expected '<project>,<distribution>'")]
    InvalidId(String),

    /// The operation context fired while waiting on the remote service.
    #[error("Timed out waiting for distribution {id} ({reason}){}", last_observed_suffix(.last_observed))]
    Timeout {
        id: String,
        reason: String,
        last_observed: Option<String>,
    },

    /// The remote service reported a terminal ERROR status.
    #[error("Distribution {id} entered ERROR status: {}", render_errors(.errors))]
    ConvergenceFailed { id: String, errors: Vec<String> },

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// True for a 404-equivalent from the remote service.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CloudError::Timeout { .. })
    }
}

fn last_observed_suffix(last: &Option<String>) -> String {
    match last {
        Some(last) => format!("; last observed: {}", last),
        None => String::new(),
    }
}

fn render_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        "no error details reported".to_string()
    } else {
        errors.join("; ")
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
