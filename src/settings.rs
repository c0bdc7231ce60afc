//! Application settings stored in the OS config directory, plus the
//! per-park area override tables. One typed, validated mapping replaces
//! the ad hoc per-park tables the upstream data otherwise invites.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::model::park;
use crate::paths;
use crate::pipeline::WaitThresholds;

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "I/O error: {e}"),
            SettingsError::Json(e) => write!(f, "JSON error: {e}"),
            SettingsError::Invalid(msg) => write!(f, "Invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Json(e)
    }
}

// ── Area overrides ──────────────────────────────────────────────────

/// Display name and optional color for one upstream area name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AreaOverride {
    pub display_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Upstream area name → override, for one park. Keys are stored
/// lowercase-trimmed; lookups normalize the same way, so any casing the
/// feed uses matches. Absence of an entry means the upstream name passes
/// through unchanged with no color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaOverrides(IndexMap<String, AreaOverride>);

impl AreaOverrides {
    pub fn get(&self, upstream_name: &str) -> Option<&AreaOverride> {
        self.0.get(&normalize_key(upstream_name))
    }

    pub fn insert(&mut self, upstream_name: &str, value: AreaOverride) {
        self.0.insert(normalize_key(upstream_name), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Re-key every entry lowercase-trimmed. Applied after deserializing a
    /// hand-edited settings file so lookup never depends on how the user
    /// typed the key.
    fn normalized(self) -> Self {
        let mut out = Self::default();
        for (key, value) in self.0 {
            out.insert(&key, value);
        }
        out
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ── App settings ─────────────────────────────────────────────────────

/// Application-level settings. Everything has a default so a missing or
/// partial file still yields a working configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    /// CORS-bypass relay prepended to the upstream URL. Empty disables the
    /// relay and hits the API directly.
    #[serde(default = "default_relay_prefix")]
    pub relay_prefix: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_park_id")]
    pub default_park_id: u32,
    #[serde(default)]
    pub thresholds: WaitThresholds,
    /// Per-park area override tables, keyed by park id.
    #[serde(default)]
    pub area_overrides: HashMap<u32, AreaOverrides>,
}

const SETTINGS_VERSION: u32 = 1;

fn default_relay_prefix() -> String {
    "https://corsproxy.io/?url=".to_string()
}

fn default_api_base() -> String {
    "https://queue-times.com/parks/".to_string()
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_park_id() -> u32 {
    334
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            relay_prefix: default_relay_prefix(),
            api_base: default_api_base(),
            refresh_interval_secs: default_refresh_interval(),
            default_park_id: default_park_id(),
            thresholds: WaitThresholds::default(),
            area_overrides: HashMap::new(),
        }
    }
}

impl Settings {
    /// Override table for a park, or an empty table when none is configured.
    pub fn overrides_for(&self, park_id: u32) -> AreaOverrides {
        self.area_overrides
            .get(&park_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Reject configurations that would misbehave at runtime rather than
    /// failing later from a fragile lookup.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.refresh_interval_secs == 0 {
            return Err(SettingsError::Invalid(
                "refresh_interval_secs must be at least 1".to_string(),
            ));
        }
        self.thresholds.validate().map_err(SettingsError::Invalid)?;
        if park::park_by_id(self.default_park_id).is_none() {
            return Err(SettingsError::Invalid(format!(
                "default_park_id {} is not a supported park",
                self.default_park_id
            )));
        }
        for park_id in self.area_overrides.keys() {
            if park::park_by_id(*park_id).is_none() {
                return Err(SettingsError::Invalid(format!(
                    "area_overrides references unknown park id {park_id}"
                )));
            }
        }
        Ok(())
    }
}

// ── Load / save ──────────────────────────────────────────────────────

/// Load settings from the app config directory. Returns `Ok(None)` if no
/// settings file exists; a file that fails to parse or validate is an
/// error, never silently replaced.
pub fn load_settings(app_config_dir: &Path) -> Result<Option<Settings>, SettingsError> {
    let path = paths::settings_path(app_config_dir);
    if !path.exists() {
        return Ok(None);
    }
    let mut settings: Settings = read_json(&path)?;
    settings.area_overrides = settings
        .area_overrides
        .into_iter()
        .map(|(park_id, table)| (park_id, table.normalized()))
        .collect();
    settings.validate()?;
    Ok(Some(settings))
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &Settings) -> Result<(), SettingsError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&paths::settings_path(app_config_dir), settings)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SettingsError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SettingsError> {
    let text = serde_json::to_string_pretty(value)?;
    atomic_write(path, text.as_bytes())
}

/// Atomically write bytes using write-to-temp-then-rename, so a crash
/// mid-write never leaves a truncated settings file.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), SettingsError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
