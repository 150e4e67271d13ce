//! Model provisioning: make sure `<root>/<subfolder>` holds a usable model.
//!
//! One sequential pass:
//!
//! 0. **Validation**: the subfolder must be a plain relative path; nothing
//!    is fetched otherwise.
//! 1. **Short-circuit**: a non-empty destination is taken as present.
//! 2. **Scoped fetch**: download only the subfolder into the destination.
//! 3. **Whole-repository fallback**: when the scoped fetch is unsupported or
//!    the identifier is rejected, download the whole repository into a
//!    temporary directory, locate the subfolder (direct join, then recursive
//!    search) and move it into place.  The temporary directory is removed on
//!    every exit path.  The destination must now be non-empty.
//! 4. **Auxiliary backfill**: `vocab.txt` and `config.json`, when absent, are
//!    fetched from the fallback repository.  Failures are tolerated.
//! 5. **Readiness**: the checkpoint, vocabulary and configuration that will
//!    be used are summarised.
//!
//! A failed download never leaves files behind in the destination, so the
//! next run's short-circuit only ever sees a completed acquisition.

use std::{fs, path::Path};

use tracing::{error, info, warn};

use crate::{
    artifacts::{ArtifactSet, Readiness, CONFIG_FILE, VOCAB_FILE},
    config::{FallbackSpec, LocalDestination, ProvisionConfig, RemoteModelSpec},
    error::{ProvisionError, Result},
    fetch::{validate_subfolder, FetchOutcome, RemoteFetcher},
    relocate::{discard, find_subfolder, is_non_empty_dir, move_dir, place_file},
};

/// Prefix of the scratch directory used by the whole-repository fallback.
pub const TEMP_PREFIX: &str = "hf_repo_";

/// How the model directory came to be populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// The destination was already non-empty; nothing was downloaded.
    AlreadyPresent,
    /// The subfolder was fetched directly.
    Scoped,
    /// The whole repository was fetched and the subfolder moved out of it.
    /// `reason` is why the scoped fetch was not used.
    WholeRepository { reason: String },
}

/// What happened to one auxiliary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backfill {
    AlreadyPresent,
    Fetched,
    Failed,
}

/// Summary of one provisioning run.
#[derive(Debug)]
pub struct ProvisionReport {
    pub acquisition: Acquisition,
    pub vocab: Backfill,
    pub config: Backfill,
    /// Non-fatal problems ([`ProvisionError::AuxiliaryFetchFailed`]).
    pub warnings: Vec<ProvisionError>,
    pub artifacts: ArtifactSet,
    pub readiness: Readiness,
}

/// Provision the model described by `config` using `fetcher`.
pub fn provision(fetcher: &dyn RemoteFetcher, config: &ProvisionConfig) -> Result<ProvisionReport> {
    ensure_model_available(fetcher, &config.remote, &config.destination, &config.fallback)
}

/// Idempotently materialise `spec` under `dest`, backfilling auxiliary files
/// from `fallback`.
pub fn ensure_model_available(
    fetcher: &dyn RemoteFetcher,
    spec: &RemoteModelSpec,
    dest: &LocalDestination,
    fallback: &FallbackSpec,
) -> Result<ProvisionReport> {
    validate_subfolder(&spec.subfolder).map_err(ProvisionError::InvalidSubfolder)?;
    validate_subfolder(dest.subfolder()).map_err(ProvisionError::InvalidSubfolder)?;

    fs::create_dir_all(&dest.root).map_err(|e| ProvisionError::io(&dest.root, e))?;
    let dir = dest.dir();

    // ── 1. Existence short-circuit ───────────────────────────────────────────
    let acquisition = if is_non_empty_dir(&dir) {
        info!(dir = %dir.display(), "model already present");
        Acquisition::AlreadyPresent
    } else {
        info!(
            repo_id = %spec.repo_id,
            subfolder = %spec.subfolder,
            dir = %dir.display(),
            "downloading model"
        );
        let acquisition = acquire(fetcher, spec, &dir)?;
        if !is_non_empty_dir(&dir) {
            return Err(ProvisionError::EmptyDestination(dir));
        }
        acquisition
    };

    // ── 4. Auxiliary backfill ────────────────────────────────────────────────
    let mut warnings = Vec::new();
    let vocab = backfill(fetcher, fallback, &dir, VOCAB_FILE, &mut warnings);
    let config = backfill(fetcher, fallback, &dir, CONFIG_FILE, &mut warnings);

    // ── 5. Readiness ─────────────────────────────────────────────────────────
    let readiness = ArtifactSet::readiness(&dir);
    match &readiness {
        Readiness::Ready { weights, .. } => info!(checkpoint = %weights.display(), "model ready"),
        Readiness::MissingCheckpoint { dir, .. } => {
            warn!(dir = %dir.display(), "checkpoint missing, inspect the directory contents")
        }
    }

    Ok(ProvisionReport {
        acquisition,
        vocab,
        config,
        warnings,
        artifacts: ArtifactSet::scan(&dir),
        readiness,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Steps 2–3
// ─────────────────────────────────────────────────────────────────────────────

fn acquire(fetcher: &dyn RemoteFetcher, spec: &RemoteModelSpec, dir: &Path) -> Result<Acquisition> {
    // `dir` is absent or empty here; an empty one may be a mount point.
    let existed = dir.is_dir();

    let reason = match fetcher.fetch_subfolder(&spec.repo_id, &spec.subfolder, dir) {
        FetchOutcome::Success(_) => {
            info!(dir = %dir.display(), "model downloaded");
            return Ok(Acquisition::Scoped);
        }
        FetchOutcome::UnsupportedMode(reason) => {
            info!(%reason, "scoped fetch unsupported, fetching the whole repository");
            reason
        }
        FetchOutcome::InvalidIdentifier(reason) => {
            info!(%reason, "scoped fetch rejected, fetching the whole repository");
            reason
        }
        FetchOutcome::OtherError(detail) => {
            error!(repo_id = %spec.repo_id, %detail, "unexpected error during download");
            if let Err(e) = discard(dir, existed) {
                warn!(dir = %dir.display(), error = %e, "cannot remove partial download");
            }
            return Err(ProvisionError::UnexpectedFetchError {
                repo_id: spec.repo_id.clone(),
                detail,
            });
        }
    };

    if dir.is_dir() {
        discard(dir, existed).map_err(|e| ProvisionError::io(dir, e))?;
    }

    fetch_and_relocate(fetcher, spec, dir)?;
    Ok(Acquisition::WholeRepository { reason })
}

/// Whole-repository fetch into a scratch directory, then move the subfolder
/// to `dir`.  The scratch directory is dropped (and deleted) on every path.
fn fetch_and_relocate(
    fetcher: &dyn RemoteFetcher,
    spec: &RemoteModelSpec,
    dir: &Path,
) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempdir()
        .map_err(|e| ProvisionError::io(std::env::temp_dir(), e))?;

    match fetcher.fetch_repository(&spec.repo_id, scratch.path()) {
        FetchOutcome::Success(_) => {}
        FetchOutcome::UnsupportedMode(detail)
        | FetchOutcome::InvalidIdentifier(detail)
        | FetchOutcome::OtherError(detail) => {
            error!(repo_id = %spec.repo_id, %detail, "whole-repository download failed");
            return Err(ProvisionError::UnexpectedFetchError {
                repo_id: spec.repo_id.clone(),
                detail,
            });
        }
    }

    let src = find_subfolder(scratch.path(), &spec.subfolder).ok_or_else(|| {
        ProvisionError::SubfolderNotFound {
            repo_id: spec.repo_id.clone(),
            subfolder: spec.subfolder.clone(),
        }
    })?;

    move_dir(&src, dir).map_err(|e| ProvisionError::io(dir, e))?;
    info!(dir = %dir.display(), "model moved into place");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Step 4
// ─────────────────────────────────────────────────────────────────────────────

fn backfill(
    fetcher: &dyn RemoteFetcher,
    fallback: &FallbackSpec,
    dir: &Path,
    filename: &str,
    warnings: &mut Vec<ProvisionError>,
) -> Backfill {
    let target = dir.join(filename);
    if target.exists() {
        return Backfill::AlreadyPresent;
    }

    let remote_path = fallback.file_path(filename);
    info!(file = filename, repo_id = %fallback.repo_id, "fetching from fallback repository");

    let detail = match fetcher.fetch_file(&fallback.repo_id, &remote_path) {
        FetchOutcome::Success(local) => match place_file(&local, &target) {
            Ok(()) => return Backfill::Fetched,
            Err(e) => format!("cannot place {}: {e}", target.display()),
        },
        FetchOutcome::UnsupportedMode(detail)
        | FetchOutcome::InvalidIdentifier(detail)
        | FetchOutcome::OtherError(detail) => detail,
    };

    let failure = ProvisionError::AuxiliaryFetchFailed {
        file: filename.to_string(),
        repo_id: fallback.repo_id.clone(),
        detail,
    };
    warn!("{failure}; continuing without it");
    warnings.push(failure);
    Backfill::Failed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
