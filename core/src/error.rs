use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("index store unavailable at '{}': {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("commit of generation {generation} to '{}' failed: {source}", .path.display())]
    CommitFailed {
        path: PathBuf,
        generation: u64,
        #[source]
        source: io::Error,
    },

    #[error("invalid ranking model '{0}': expected VS or OK")]
    Configuration(String),

    #[error("query '{0}' contains no searchable terms")]
    QueryUnparsable(String),

    #[error("no index could be opened at '{}': {reason}", .path.display())]
    IndexUnavailable { path: PathBuf, reason: String },

    #[error("document directory '{}' does not exist or is not readable", .0.display())]
    DocsUnavailable(PathBuf),

    /// Per-document failure. The build loop logs and skips these.
    #[error("could not extract '{}': {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures that only affect a single document during a build.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Extraction { .. })
    }
}
