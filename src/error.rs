use std::path::PathBuf;

/// Result alias for `tierview`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned at the crate boundary: loading data, loading configuration
/// and parsing interaction tokens.
///
/// View operations themselves never fail; they degrade to a
/// [`Warning`](crate::view::Warning) and a best-effort view.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// JSON input could not be decoded.
    #[error("failed to parse {what}: {source}")]
    Parse {
        /// What was being parsed (dataset, config, ...).
        what: &'static str,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// An interaction token did not name a known action.
    #[error("unknown action token '{0}'")]
    UnknownAction(String),
}
