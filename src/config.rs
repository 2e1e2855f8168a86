use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::protocol::ChatMode;
use crate::throttle::ThrottleConfig;

/// Persisted settings for the demo front-end and the service it hosts.
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    /// Mode used for plain (non-command) input
    pub default_mode: ChatMode,
    /// Throttle limits handed to the message service
    pub throttle: ThrottleConfig,
    /// Outgoing messages matching any of these patterns are dropped
    pub filter_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: ChatMode::Public,
            throttle: ThrottleConfig::default(),
            filter_patterns: vec![],
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("com", "sendgate", "sendgate") {
        let dir = proj.config_dir();
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(error = %e, "failed to create config dir");
            return None;
        }
        return Some(dir.join("settings.json"));
    }
    None
}

/// Load settings, falling back to defaults when the file is missing or
/// unreadable.
pub fn load_settings() -> Settings {
    let path = match settings_path() {
        Some(path) => path,
        None => return Settings::default(),
    };

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        // No file yet is the normal first run.
        Err(_) => return Settings::default(),
    };

    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<(), String> {
    let path = settings_path().ok_or("Could not determine settings path")?;
    let data = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(&path, data).map_err(|e| format!("Failed to write settings: {}", e))
}
