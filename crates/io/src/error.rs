use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce records from a source. Aborts the run before any
/// store mutation.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A strategy key, edition or similar routing name that does not exist.
    #[error("unknown {kind} '{name}'")]
    UnknownSource { kind: &'static str, name: String },

    #[error("strategy '{strategy}' requires option '{option}'")]
    MissingOption {
        strategy: &'static str,
        option: &'static str,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("cannot fetch {url}: {message}")]
    Http { url: String, message: String },

    #[error("missing column '{0}'")]
    MissingColumn(String),
}
