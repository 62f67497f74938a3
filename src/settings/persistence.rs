use super::ScopeSettings;
use std::{fs, io, path::Path};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access settings file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScopeSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        let mut settings: ScopeSettings = serde_json::from_str(&text)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path)
            .map_err(|e| warn!("[settings] falling back to defaults, {path:?}: {e}"))
            .unwrap_or_default()
    }

    /// Writes to a sibling `.json.tmp` file, then renames it into place.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let mut data = self.clone();
        data.sanitize();
        let json = serde_json::to_string_pretty(&data)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
