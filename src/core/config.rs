/*
 * Application configuration: where the bundler reads from and writes to, which
 * files are eligible, which top-level directories are decomposed, and the
 * process-wide `AppSettings`. Configuration lives in a single JSON document in
 * which every field is optional; anything missing falls back to the built-in
 * defaults below.
 *
 * `ConfigManagerOperations` abstracts where that document is found so tests
 * can point the lookup at temporary directories. `CoreConfigManager` searches
 * an explicit path first, then the working directory, then the platform local
 * config directory (via `path_utils`).
 */
use super::models::{DecodePolicy, DirectoryRule, EligibilityFilter};
use super::settings::AppSettings;
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "tree_bundler";
pub const WORKING_DIR_CONFIG_FILENAME: &str = "tree_bundler.json";
const APP_DIR_CONFIG_FILENAME: &str = "config.json";

const DEFAULT_ROOT: &str = "src";
const DEFAULT_OUTPUT_DIR: &str = "ai_dumps_frontend";
const DEFAULT_BUNDLE_TITLE: &str = "FRONTEND FOLDER";
const DEFAULT_INCLUDE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".css", ".scss", ".json", ".md", ".html",
];
const DEFAULT_EXCLUDE_DIR_NAMES: &[&str] = &[
    "__pycache__",
    ".git",
    ".idea",
    ".vscode",
    "node_modules",
    "dist",
    "build",
];
const DEFAULT_DECOMPOSED_DIRS: &[&str] = &["features", "student"];

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, io::Error),
    Serde(PathBuf, serde_json::Error),
    NotFound(PathBuf),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Configuration I/O error for {path:?}: {e}"),
            ConfigError::Serde(path, e) => {
                write!(f, "Configuration file {path:?} is not valid: {e}")
            }
            ConfigError::NotFound(path) => write!(f, "Configuration file not found: {path:?}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Serde(_, e) => Some(e),
            ConfigError::NotFound(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub include_extensions: Vec<String>,
    pub exclude_dir_names: Vec<String>,
    pub directory_rules: Vec<DirectoryRule>,
    pub bundle_title: String,
    pub decode_policy: DecodePolicy,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        BundlerConfig {
            root: PathBuf::from(DEFAULT_ROOT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            include_extensions: to_strings(DEFAULT_INCLUDE_EXTENSIONS),
            exclude_dir_names: to_strings(DEFAULT_EXCLUDE_DIR_NAMES),
            directory_rules: DEFAULT_DECOMPOSED_DIRS
                .iter()
                .map(|name| DirectoryRule::decompose(name))
                .collect(),
            bundle_title: DEFAULT_BUNDLE_TITLE.to_string(),
            decode_policy: DecodePolicy::default(),
        }
    }
}

impl BundlerConfig {
    pub fn eligibility_filter(&self) -> EligibilityFilter {
        EligibilityFilter::new(&self.include_extensions, self.exclude_dir_names.iter().cloned())
    }

    // Names of top-level directories that are split into per-subdirectory bundles.
    pub fn decomposed_names(&self) -> HashSet<String> {
        self.directory_rules
            .iter()
            .filter(|rule| rule.decompose)
            .map(|rule| rule.name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bundler: BundlerConfig,
    pub settings: AppSettings,
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

// Configuration together with the file it was read from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, explicit_path: Option<&Path>) -> Result<LoadedConfig>;
}

pub struct CoreConfigManager {
    working_dir: PathBuf,
    app_config_dir: Option<PathBuf>,
}

impl CoreConfigManager {
    /*
     * Searches the current working directory and the platform local config
     * directory for `app_name`.
     */
    pub fn new(app_name: &str) -> Self {
        CoreConfigManager {
            working_dir: PathBuf::from("."),
            app_config_dir: path_utils::get_base_app_config_local_dir(app_name),
        }
    }

    pub fn with_search_dirs(working_dir: PathBuf, app_config_dir: Option<PathBuf>) -> Self {
        CoreConfigManager {
            working_dir,
            app_config_dir,
        }
    }

    fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.working_dir.join(WORKING_DIR_CONFIG_FILENAME)];
        if let Some(dir) = &self.app_config_dir {
            candidates.push(dir.join(APP_DIR_CONFIG_FILENAME));
        }
        candidates
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new(APP_NAME)
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * An explicit path must exist. Without one, the first existing candidate
     * wins and the built-in defaults are used when none exists.
     */
    fn load_config(&self, explicit_path: Option<&Path>) -> Result<LoadedConfig> {
        if let Some(path) = explicit_path {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return read_config_file(path);
        }

        for candidate in self.candidate_paths() {
            if candidate.is_file() {
                return read_config_file(&candidate);
            }
            log::trace!("CoreConfigManager: No config at {candidate:?}.");
        }

        log::debug!("CoreConfigManager: No configuration file found, using defaults.");
        Ok(LoadedConfig {
            config: AppConfig::default(),
            source: None,
        })
    }
}

fn read_config_file(path: &Path) -> Result<LoadedConfig> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let config =
        AppConfig::from_json_str(&text).map_err(|e| ConfigError::Serde(path.to_path_buf(), e))?;
    log::debug!("CoreConfigManager: Loaded configuration from {path:?}.");
    Ok(LoadedConfig {
        config,
        source: Some(path.to_path_buf()),
    })
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
