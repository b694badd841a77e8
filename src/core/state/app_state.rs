use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::i18n::Language;
use crate::core::instance::InstanceManager;

const APP_DIR_NAME: &str = "ModInstaller";
const SETTINGS_FILE: &str = "installer_settings.json";

/// How a data-mod archive reaches its destination directory.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Delete the destination, then extract straight into the mods directory.
    #[default]
    InPlace,
    /// Extract into a sibling temp directory, then swap it into place.
    Staged,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallerSettings {
    /// Directory the last successful pick was made from.
    #[serde(default)]
    pub last_dir: Option<PathBuf>,
    #[serde(default)]
    pub extraction: ExtractionStrategy,
}

impl InstallerSettings {
    /// Records the directory of a picked source for the next pick.
    pub fn remember_pick(&mut self, picked: &Path) {
        if let Some(parent) = picked.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.last_dir = Some(parent.to_path_buf());
        }
    }
}

pub struct AppState {
    pub data_dir: PathBuf,
    pub instance_manager: InstanceManager,
    pub settings: InstallerSettings,
    pub language: Language,
}

impl AppState {
    /// State rooted at the platform data directory.
    pub fn new() -> Self {
        Self::with_data_dir(default_data_dir())
    }

    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let instance_manager = InstanceManager::new(data_dir.join("instances"));
        let settings = load_settings_from_disk(&data_dir).unwrap_or_default();
        let language = load_language_from_disk(&data_dir).unwrap_or_else(Language::english);

        Self {
            data_dir,
            instance_manager,
            settings,
            language,
        }
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.data_dir.join("instances")
    }

    pub fn save_settings(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let settings_path = self.data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(settings_path, json)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn load_settings_from_disk(data_dir: &Path) -> Option<InstallerSettings> {
    let path = data_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring corrupt settings at {:?}: {}", path, e);
            None
        }
    }
}

/// `lang.json` in the data directory overrides the built-in English strings.
fn load_language_from_disk(data_dir: &Path) -> Option<Language> {
    let raw = std::fs::read_to_string(data_dir.join("lang.json")).ok()?;
    match Language::from_json(&raw) {
        Ok(language) => Some(language),
        Err(e) => {
            warn!("Ignoring unreadable lang.json: {}", e);
            None
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let dir = default_base_dir().join(APP_DIR_NAME);

    if !dir.exists() {
        let _ = std::fs::create_dir_all(&dir);
    }

    dir
}
