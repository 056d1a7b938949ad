use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Settings file not found. Looked in:\n\
        - current directory: cdnflow.local.yaml, cdnflow.yaml\n\
        - ./.cdnflow/ directory\n\
        - ~/.config/cdnflow/cdnflow.yaml\n\
        Set CDNFLOW_CONFIG_PATH to point at a file directly"
    )]
    SettingsFileNotFound,

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
