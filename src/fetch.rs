//! Remote fetch capability.
//!
//! [`RemoteFetcher`] is the only seam between the resolver and the network.
//! Every call reports a tagged [`FetchOutcome`] instead of an error type, so
//! the resolver can pick its fallback with a plain `match`.
//!
//! [`HubFetcher`] implements it over the blocking HuggingFace Hub client:
//! files go through the hub cache (`~/.cache/huggingface/hub` by default) and
//! are then copied, symlinks followed, into the requested directory.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use hf_hub::api::sync::{Api, ApiBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one remote fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Local path of the fetched file or directory.
    Success(PathBuf),
    /// The fetch capability cannot serve this request shape.
    UnsupportedMode(String),
    /// The remote store rejected the repository or path identifier.
    InvalidIdentifier(String),
    /// Anything else (network, HTTP status, local I/O).
    OtherError(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Abstract remote artifact store.
///
/// All calls block until the transfer finished or failed.
pub trait RemoteFetcher {
    /// Fetch only `subfolder` of `repo_id`, placing its files (paths relative
    /// to the subfolder) under `dest`.
    fn fetch_subfolder(&self, repo_id: &str, subfolder: &str, dest: &Path) -> FetchOutcome;

    /// Fetch every file of `repo_id` under `dest`, preserving repository paths.
    fn fetch_repository(&self, repo_id: &str, dest: &Path) -> FetchOutcome;

    /// Fetch a single file and return where it landed locally.
    fn fetch_file(&self, repo_id: &str, path: &str) -> FetchOutcome;
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifier validation (HuggingFace repo-id rules)
// ─────────────────────────────────────────────────────────────────────────────

static RE_REPO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9_.\-]+/)?[A-Za-z0-9_.\-]{1,96}$").expect("static regex")
});

/// Check `repo_id` the way the hub does before issuing any request.
pub fn validate_repo_id(repo_id: &str) -> Result<(), String> {
    if !RE_REPO_ID.is_match(repo_id) {
        return Err(format!(
            "repo id '{repo_id}' must be 'name' or 'namespace/name' using only \
             alphanumerics, '-', '_' and '.', name at most 96 characters"
        ));
    }
    if repo_id.contains("--") || repo_id.contains("..") {
        return Err(format!("repo id '{repo_id}' cannot contain '--' or '..'"));
    }
    if repo_id.ends_with(".git") {
        return Err(format!("repo id '{repo_id}' cannot end with '.git'"));
    }
    for part in repo_id.split('/') {
        let bad_edge = |c: char| c == '-' || c == '.';
        if part.starts_with(bad_edge) || part.ends_with(bad_edge) {
            return Err(format!(
                "repo id '{repo_id}': '{part}' cannot start or end with '-' or '.'"
            ));
        }
    }
    Ok(())
}

/// A subfolder must be a plain relative path inside the repository.
pub fn validate_subfolder(subfolder: &str) -> Result<(), String> {
    let path = Path::new(subfolder);
    let plain = !subfolder.is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(format!("subfolder '{subfolder}' must be a relative path without '..'"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HubFetcher
// ─────────────────────────────────────────────────────────────────────────────

/// [`RemoteFetcher`] backed by `hf_hub::api::sync`.
pub struct HubFetcher {
    api: Api,
    scoped: bool,
}

impl HubFetcher {
    /// Build a client, passing `token` through as the bearer credential.
    pub fn new(token: Option<String>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let api = ApiBuilder::new()
            .with_token(token)
            .with_progress(false)
            .build()
            .context("Failed to initialise HuggingFace Hub client")?;
        Ok(Self { api, scoped: true })
    }

    /// Disable subfolder-scoped fetches: [`fetch_subfolder`](RemoteFetcher::fetch_subfolder)
    /// then always answers [`FetchOutcome::UnsupportedMode`].
    pub fn with_scoped_fetch(mut self, enabled: bool) -> Self {
        self.scoped = enabled;
        self
    }

    fn list_files(&self, repo_id: &str) -> Result<Vec<String>, String> {
        let info = self
            .api
            .model(repo_id.to_string())
            .info()
            .map_err(|e| format!("cannot list '{repo_id}': {e}"))?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    /// Download `filename` through the hub cache and return the cache path.
    fn download(&self, repo_id: &str, filename: &str) -> Result<PathBuf, String> {
        debug!(repo_id, filename, "downloading");
        self.api
            .model(repo_id.to_string())
            .get(filename)
            .map_err(|e| format!("failed to download '{filename}' from '{repo_id}': {e}"))
    }

    /// Download each `(remote, local)` pair, copying cache files into place.
    fn materialise(&self, repo_id: &str, files: &[(String, PathBuf)]) -> Result<(), String> {
        for (remote, local) in files {
            let cached = self.download(repo_id, remote)?;
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
            }
            fs::copy(&cached, local).map_err(|e| {
                format!("cannot copy {} to {}: {e}", cached.display(), local.display())
            })?;
        }
        Ok(())
    }
}

impl RemoteFetcher for HubFetcher {
    fn fetch_subfolder(&self, repo_id: &str, subfolder: &str, dest: &Path) -> FetchOutcome {
        if !self.scoped {
            return FetchOutcome::UnsupportedMode("scoped fetch disabled".to_string());
        }
        if let Err(msg) = validate_repo_id(repo_id).and_then(|_| validate_subfolder(subfolder)) {
            return FetchOutcome::InvalidIdentifier(msg);
        }

        let files = match self.list_files(repo_id) {
            Ok(files) => files,
            Err(msg) => return FetchOutcome::OtherError(msg),
        };

        let prefix = format!("{}/", subfolder.trim_end_matches('/'));
        let scoped: Vec<(String, PathBuf)> = files
            .into_iter()
            .filter_map(|f| {
                let rel = f.strip_prefix(&prefix)?.to_string();
                Some((f, dest.join(rel)))
            })
            .collect();

        // The listing only addresses top-level prefixes; a nested subfolder
        // needs the whole-repository path and its recursive search.
        if scoped.is_empty() {
            return FetchOutcome::UnsupportedMode(format!(
                "no top-level '{subfolder}/' entries in '{repo_id}'"
            ));
        }

        info!(repo_id, subfolder, files = scoped.len(), "fetching subfolder");
        match self.materialise(repo_id, &scoped) {
            Ok(()) => FetchOutcome::Success(dest.to_path_buf()),
            Err(msg) => FetchOutcome::OtherError(msg),
        }
    }

    fn fetch_repository(&self, repo_id: &str, dest: &Path) -> FetchOutcome {
        if let Err(msg) = validate_repo_id(repo_id) {
            return FetchOutcome::InvalidIdentifier(msg);
        }
        let files = match self.list_files(repo_id) {
            Ok(files) => files,
            Err(msg) => return FetchOutcome::OtherError(msg),
        };

        info!(repo_id, files = files.len(), "fetching whole repository");
        let all: Vec<(String, PathBuf)> = files
            .into_iter()
            .map(|f| {
                let local = dest.join(&f);
                (f, local)
            })
            .collect();
        match self.materialise(repo_id, &all) {
            Ok(()) => FetchOutcome::Success(dest.to_path_buf()),
            Err(msg) => FetchOutcome::OtherError(msg),
        }
    }

    fn fetch_file(&self, repo_id: &str, path: &str) -> FetchOutcome {
        if let Err(msg) = validate_repo_id(repo_id) {
            return FetchOutcome::InvalidIdentifier(msg);
        }
        match self.download(repo_id, path) {
            Ok(local) => FetchOutcome::Success(local),
            Err(msg) => FetchOutcome::OtherError(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
