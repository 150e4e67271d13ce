//! Provisioning error taxonomy.
//!
//! Fetch-compatibility failures (`UnsupportedMode`, `InvalidIdentifier`) are
//! not errors here: they are [`FetchOutcome`](crate::fetch::FetchOutcome)
//! variants the resolver recovers from by switching to the whole-repository
//! path.  Everything below either aborts a provisioning run or, in the case of
//! [`ProvisionError::AuxiliaryFetchFailed`], is recorded and tolerated.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The configured subfolder is not a plain relative path.
    #[error("invalid subfolder: {0}")]
    InvalidSubfolder(String),

    /// The subfolder was not present in the whole-repository download, not
    /// even nested somewhere inside it.
    #[error("subfolder '{subfolder}' not found inside downloaded repository '{repo_id}'")]
    SubfolderNotFound { repo_id: String, subfolder: String },

    /// A single optional file could not be fetched from the fallback
    /// repository.  Never fatal.
    #[error("could not fetch '{file}' from '{repo_id}': {detail}")]
    AuxiliaryFetchFailed {
        file: String,
        repo_id: String,
        detail: String,
    },

    /// The fetch capability failed in a way that has no fallback.
    #[error("unexpected error while fetching '{repo_id}': {detail}")]
    UnexpectedFetchError { repo_id: String, detail: String },

    /// The download reported success but the destination holds nothing.
    #[error("download finished but {} is empty", .0.display())]
    EmptyDestination(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProvisionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for conditions that end a provisioning run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AuxiliaryFetchFailed { .. })
    }
}
