//! Configuration management for Findex.
//!
//! Configuration is a small JSON object stored in a platform-appropriate
//! location. Loading fills in defaults for missing keys and writes the
//! normalized object back, so users always find every option spelled out
//! in the file.
//!
//! ## Example Configuration File (findex.json)
//!
//! ```json
//! {
//!   "min_length": 1,
//!   "paths": [
//!     "~/*",
//!     "~/Projects/**"
//!   ],
//!   "scan_interval": 900
//! }
//! ```

use crate::error::{FindexError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default minimum query length
pub const DEFAULT_MIN_LENGTH: usize = 1;
/// Default glob pattern to index
pub const DEFAULT_PATH: &str = "~/*";
/// Default seconds between rescans
pub const DEFAULT_SCAN_INTERVAL: u64 = 900;

/// Name of the configuration file inside the config directory
const CONFIG_FILE_NAME: &str = "findex.json";

/// Main configuration structure for Findex.
///
/// Loaded once at startup and shared read-only by the refresher and the
/// query engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum trimmed query length before any results are produced
    pub min_length: usize,

    /// Glob patterns to index, in order (`~` and `**` are supported)
    pub paths: Vec<String>,

    /// Seconds between automatic rescans
    pub scan_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_length: DEFAULT_MIN_LENGTH,
            paths: vec![DEFAULT_PATH.to_string()],
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file is treated as an empty object. Defaults are merged in
    /// for absent keys only, and the file is rewritten when that changed
    /// anything. A failed rewrite is logged and the merged config is still
    /// returned.
    pub fn load_from(path: &Path) -> Result<Self> {
        let original = read_object(path)?;

        let mut merged = original.clone();
        apply_defaults(&mut merged);

        let config: Config = serde_json::from_value(Value::Object(merged.clone()))
            .map_err(|e| FindexError::config(path, e.to_string()))?;
        config.validate(path)?;

        if merged != original {
            if let Err(e) = write_object(path, &merged) {
                warn!(path = %path.display(), error = %e, "Failed to persist normalized config");
            }
        }

        Ok(config)
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "findex").ok_or(FindexError::NoConfigDir)?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Interval between automatic rescans.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Check whether a trimmed, lower-cased query is long enough to search.
    pub fn accepts_query(&self, query: &str) -> bool {
        query.chars().count() >= self.min_length
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.scan_interval == 0 {
            return Err(FindexError::config(path, "scan_interval must be positive"));
        }
        Ok(())
    }
}

/// Read the config file as a JSON object, or an empty one if it is absent.
fn read_object(path: &Path) -> Result<Map<String, Value>> {
    if !path.is_file() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(Map::new());
    }

    info!(path = %path.display(), "Reading configuration");
    let contents = fs::read_to_string(path)?;
    match serde_json::from_str(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(FindexError::config(path, "expected a JSON object")),
        Err(e) => Err(FindexError::config(path, e.to_string())),
    }
}

/// Insert defaults for missing keys without touching existing ones.
fn apply_defaults(map: &mut Map<String, Value>) {
    map.entry("min_length")
        .or_insert_with(|| Value::from(DEFAULT_MIN_LENGTH));
    map.entry("paths")
        .or_insert_with(|| Value::from(vec![DEFAULT_PATH]));
    map.entry("scan_interval")
        .or_insert_with(|| Value::from(DEFAULT_SCAN_INTERVAL));
}

/// Write a JSON object with sorted keys, 2-space indentation and a trailing
/// newline.
fn write_object(path: &Path, map: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    info!(path = %path.display(), "Writing configuration");
    // serde_json::Map is ordered by key unless `preserve_order` is enabled
    let mut contents = serde_json::to_string_pretty(map)?;
    contents.push('\n');
    fs::write(path, contents)?;
    Ok(())
}
