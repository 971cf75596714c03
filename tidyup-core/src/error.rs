//! Error types for tidyup-core.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from local persistence and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Filesystem failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// `config.yaml` exists but is not valid YAML for [`crate::Config`].
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so `~/.tidyup/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },
}

pub fn io_err(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
