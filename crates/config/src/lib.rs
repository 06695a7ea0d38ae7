//! Configuration for pickr.
//!
//! Settings are layered, later layers overriding earlier ones:
//! 1. built-in defaults,
//! 2. a config file (TOML, YAML or JSON, chosen by extension), either given
//!    explicitly or `pickr.toml` in the platform config directory,
//! 3. `PICKR_*` environment variables (`PICKR_USE_CACHE=false`,
//!    `PICKR_FOLDERS=[/comics,/books]`).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "PICKR_";
const CONFIG_FILE: &str = "pickr.toml";
const TRACKER_FILE: &str = "read_files.json";
const FALLBACK_STATE_DIR: &str = ".pickr";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "pickr")
}

/// Where the config file is looked for when none is given explicitly.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folders to pick from.
    pub folders: Vec<PathBuf>,
    /// File name prefix (or comma-separated prefixes) to skip. Files that
    /// have been dealt with are conventionally renamed with `_L_`.
    pub exclude_prefix: String,
    /// Folders whose name starts with this are never searched.
    pub ignore_folder_prefix: String,
    pub keywords: Vec<String>,
    /// Require every keyword instead of any one of them.
    pub keywords_match_all: bool,
    pub ignored_extensions: Vec<String>,
    /// Continue numbered series instead of picking purely at random.
    pub use_sequence: bool,
    /// Pick a file from inside ZIP archives.
    pub process_zip: bool,
    pub use_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub tracker_file: Option<PathBuf>,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            exclude_prefix: "_L_".to_string(),
            ignore_folder_prefix: ".".to_string(),
            keywords: Vec::new(),
            keywords_match_all: false,
            ignored_extensions: Vec::new(),
            use_sequence: true,
            process_zip: true,
            use_cache: true,
            cache_dir: None,
            tracker_file: None,
        }
    }
}
impl Settings {
    /// The layered figment, before extraction.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
                match extension.as_deref() {
                    Some("toml") => figment.merge(Toml::file(path)),
                    Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                    Some("json") => figment.merge(Json::file(path)),
                    _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
                }
            },
            None => match default_config_file() {
                Some(default) => figment.merge(Toml::file(default)),
                None => figment,
            },
        };
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load settings from every layer.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings: Settings = Self::figment(path)?.extract().or_raise(|| ErrorKind::Invalid)?;
        tracing::debug!(folders = settings.folders.len(), "configuration loaded");
        Ok(settings)
    }

    /// Directory for cache files: the configured one, else the platform
    /// cache directory, else `.pickr/cache`.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| match project_dirs() {
            Some(dirs) => dirs.cache_dir().to_path_buf(),
            None => Path::new(FALLBACK_STATE_DIR).join("cache"),
        })
    }

    /// File recording what has been read: the configured one, else
    /// `read_files.json` in the platform data directory, else in `.pickr/`.
    pub fn tracker_file(&self) -> PathBuf {
        self.tracker_file.clone().unwrap_or_else(|| match project_dirs() {
            Some(dirs) => dirs.data_dir().join(TRACKER_FILE),
            None => Path::new(FALLBACK_STATE_DIR).join(TRACKER_FILE),
        })
    }
}
