//! Errors reported by loaders.

use std::path::PathBuf;

use thiserror::Error;


/// Failure reported by a [`Loader`](crate::loader::Loader).
///
/// Tree operations themselves never fail; this is the only error channel,
/// and batch loads hand it back to the caller unchanged.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid arguments: {0}")]
    Flag(#[from] clap::Error),

    /// The document parsed but its top level is not a mapping.
    #[error("expected a top-level object, found {0}")]
    NotAnObject(&'static str),

    /// A one-shot loader was asked to load a second time.
    #[error("loader input already consumed")]
    Exhausted,

    #[error("unsupported config format for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl LoadError {
    /// Wrap any error type as [`LoadError::Custom`].
    pub fn custom<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        LoadError::Custom(error.into())
    }
}
