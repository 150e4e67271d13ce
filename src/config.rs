//! Provisioning configuration, read from the environment.
//!
//! | Variable                  | Default                     |
//! |---------------------------|-----------------------------|
//! | `HF_REPO`                 | `Misha24-10/F5-TTS_RUSSIAN` |
//! | `HF_SUBDIR`               | `F5TTS_v1_Base_v2`          |
//! | `LOCAL_MODELS_DIR`        | `/models`                   |
//! | `HUGGINGFACE_HUB_TOKEN`   | unset (anonymous)           |
//! | `HF_FALLBACK_REPO`        | `SWivid/F5-TTS`             |
//! | `HF_FALLBACK_SUBDIR`      | `F5TTS_v1_Base`             |
//! | `HF_DISABLE_SCOPED_FETCH` | unset                       |
//!
//! Blank values count as unset.

use std::path::{Path, PathBuf};

pub const DEFAULT_REPO: &str = "Misha24-10/F5-TTS_RUSSIAN";
pub const DEFAULT_SUBDIR: &str = "F5TTS_v1_Base_v2";
pub const DEFAULT_MODELS_DIR: &str = "/models";
pub const DEFAULT_FALLBACK_REPO: &str = "SWivid/F5-TTS";
pub const DEFAULT_FALLBACK_SUBDIR: &str = "F5TTS_v1_Base";

/// Identity of the artifact set to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteModelSpec {
    pub repo_id: String,
    pub subfolder: String,
    pub token: Option<String>,
}

/// Where the artifacts must end up: `<root>/<subfolder>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDestination {
    pub root: PathBuf,
    subfolder: String,
}

impl LocalDestination {
    pub fn new(root: impl Into<PathBuf>, subfolder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            subfolder: subfolder.into(),
        }
    }

    /// The resolved model directory.
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.subfolder)
    }

    pub fn subfolder(&self) -> &str {
        &self.subfolder
    }
}

/// Secondary source for `vocab.txt` / `config.json` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSpec {
    pub repo_id: String,
    pub subfolder: String,
}

impl FallbackSpec {
    /// Repository path of `filename` inside the fallback subfolder.
    pub fn file_path(&self, filename: &str) -> String {
        if self.subfolder.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", self.subfolder.trim_end_matches('/'), filename)
        }
    }
}

impl Default for FallbackSpec {
    fn default() -> Self {
        Self {
            repo_id: DEFAULT_FALLBACK_REPO.to_string(),
            subfolder: DEFAULT_FALLBACK_SUBDIR.to_string(),
        }
    }
}

/// Everything one provisioning run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub remote: RemoteModelSpec,
    pub destination: LocalDestination,
    pub fallback: FallbackSpec,
    /// Skip the scoped fetch and go straight to the whole-repository path.
    pub disable_scoped_fetch: bool,
}

impl ProvisionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let repo_id = get("HF_REPO").unwrap_or_else(|| DEFAULT_REPO.to_string());
        let subfolder = get("HF_SUBDIR").unwrap_or_else(|| DEFAULT_SUBDIR.to_string());
        let root = get("LOCAL_MODELS_DIR").unwrap_or_else(|| DEFAULT_MODELS_DIR.to_string());

        let fallback = FallbackSpec {
            repo_id: get("HF_FALLBACK_REPO").unwrap_or_else(|| DEFAULT_FALLBACK_REPO.to_string()),
            subfolder: get("HF_FALLBACK_SUBDIR")
                .unwrap_or_else(|| DEFAULT_FALLBACK_SUBDIR.to_string()),
        };

        let disable_scoped_fetch = get("HF_DISABLE_SCOPED_FETCH")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            destination: LocalDestination::new(PathBuf::from(root), subfolder.clone()),
            remote: RemoteModelSpec {
                repo_id,
                subfolder,
                token: get("HUGGINGFACE_HUB_TOKEN"),
            },
            fallback,
            disable_scoped_fetch,
        }
    }

    /// Point the run at another subfolder, keeping the destination in sync.
    pub fn with_subfolder(mut self, subfolder: &str) -> Self {
        self.remote.subfolder = subfolder.to_string();
        self.destination = LocalDestination::new(self.destination.root.clone(), subfolder);
        self
    }

    pub fn with_models_dir(mut self, root: &Path) -> Self {
        self.destination = LocalDestination::new(root, self.remote.subfolder.clone());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ProvisionConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.remote.repo_id, DEFAULT_REPO);
        assert_eq!(cfg.remote.subfolder, DEFAULT_SUBDIR);
        assert_eq!(cfg.remote.token, None);
        assert_eq!(cfg.destination.dir(), Path::new("/models/F5TTS_v1_Base_v2"));
        assert_eq!(cfg.fallback, FallbackSpec::default());
        assert!(!cfg.disable_scoped_fetch);
    }

    #[test]
    fn test_env_overrides() {
        let cfg = ProvisionConfig::from_lookup(lookup(&[
            ("HF_REPO", "someone/other-model"),
            ("HF_SUBDIR", "ckpt"),
            ("LOCAL_MODELS_DIR", "/srv/models"),
            ("HUGGINGFACE_HUB_TOKEN", "hf_secret"),
            ("HF_DISABLE_SCOPED_FETCH", "true"),
        ]));
        assert_eq!(cfg.remote.repo_id, "someone/other-model");
        assert_eq!(cfg.destination.dir(), Path::new("/srv/models/ckpt"));
        assert_eq!(cfg.remote.token.as_deref(), Some("hf_secret"));
        assert!(cfg.disable_scoped_fetch);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let cfg = ProvisionConfig::from_lookup(lookup(&[
            ("HUGGINGFACE_HUB_TOKEN", ""),
            ("HF_SUBDIR", "   "),
        ]));
        assert_eq!(cfg.remote.token, None);
        assert_eq!(cfg.remote.subfolder, DEFAULT_SUBDIR);
    }

    #[test]
    fn test_with_subfolder_moves_destination() {
        let cfg = ProvisionConfig::from_lookup(lookup(&[])).with_subfolder("other");
        assert_eq!(cfg.remote.subfolder, "other");
        assert_eq!(cfg.destination.dir(), Path::new("/models/other"));
    }

    #[test]
    fn test_fallback_file_path() {
        let fb = FallbackSpec::default();
        assert_eq!(fb.file_path("vocab.txt"), "F5TTS_v1_Base/vocab.txt");
        let root = FallbackSpec {
            repo_id: "a/b".into(),
            subfolder: String::new(),
        };
        assert_eq!(root.file_path("config.json"), "config.json");
    }
}
