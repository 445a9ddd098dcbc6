/*
 * Process-wide application settings. An `AppSettings` value is built once at
 * startup (from the configuration file or defaults) and handed to whatever
 * needs it, such as the enforcement accessors below or the thumbnail backfill.
 */
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ENFORCEMENT_MODE: &str = "disabled";
const DEFAULT_MEDIA_ROOT: &str = "media";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub enforcement_mode: Option<String>,
    pub media_root: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            enforcement_mode: None,
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
        }
    }
}

impl AppSettings {
    // Configured enforcement mode, `"disabled"` when unset.
    pub fn enforcement_mode(&self) -> &str {
        self.enforcement_mode
            .as_deref()
            .unwrap_or(DEFAULT_ENFORCEMENT_MODE)
    }

    pub fn enforcement_enabled(&self) -> bool {
        self.enforcement_mode() != DEFAULT_ENFORCEMENT_MODE
    }
}
