use anyhow::{anyhow, Context, Result};
use log::warn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    capture::DedupScope,
    library::{sanitize_library_name, ExportOptions, DEFAULT_LIBRARY},
    utils::fs::write_atomic,
};

pub const DATA_DIR_ENV: &str = "CITECATCH_DATA_DIR";
pub const SETTINGS_FILE: &str = "settings.json";

const MIN_POLL_MS: u64 = 50;
const MAX_POLL_MS: u64 = 10_000;
const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 120_000;

/// Where libraries and settings live: `$CITECATCH_DATA_DIR`, else
/// `<config-dir>/citecatch`.
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("citecatch"))
        .ok_or_else(|| anyhow!("no per-user config directory; set {DATA_DIR_ENV}"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub active_library: String,
    pub poll_interval_ms: u64,
    pub prompt_timeout_ms: u64,
    pub dedup_scope: DedupScope,
    pub export: ExportOptions,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            active_library: DEFAULT_LIBRARY.into(),
            poll_interval_ms: 500,
            prompt_timeout_ms: 5_000,
            dedup_scope: DedupScope::default(),
            export: ExportOptions::default(),
        }
    }
}

impl UserSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(MIN_POLL_MS, MAX_POLL_MS))
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.prompt_timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> UserSettings {
        self.data.read().clone()
    }

    pub fn active_library(&self) -> String {
        self.data.read().active_library.clone()
    }

    /// Stores the sanitized name and returns it.
    pub fn set_active_library(&self, name: &str) -> Result<String> {
        let name = sanitize_library_name(name)?;
        self.update(|settings| settings.active_library = name.clone())?;
        Ok(name)
    }

    pub fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<UserSettings> {
        let mut guard = self.data.write();
        let mut next = guard.clone();
        apply(&mut next);
        self.persist(&next)?;
        *guard = next.clone();
        Ok(next)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        write_atomic(&self.path, serialized.as_bytes())
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
