use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::warn;

use crate::settings::config::Settings;

/// Loads and persists [`Settings`], keeping an in-memory copy that callers
/// share cheaply. A settings file that fails to parse is moved aside rather
/// than overwritten, so a hand-edit gone wrong is recoverable.
#[derive(Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
    inner: Arc<Mutex<Settings>>,
}

impl SettingsManager {
    pub fn new() -> Result<Self> {
        Self::from_path(Self::default_settings_path()?)
    }

    fn default_settings_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Unable to determine home directory")?;
        Ok(home.join(".fsgate").join("settings.toml"))
    }

    pub fn from_path(settings_path: PathBuf) -> Result<Self> {
        let settings = if settings_path.exists() {
            Self::load_from_file_with_backup(&settings_path)?
        } else {
            let settings = Settings::default();
            Self::write_to_file(&settings_path, &settings)?;
            settings
        };

        Ok(Self {
            settings_path,
            inner: Arc::new(Mutex::new(settings)),
        })
    }

    fn load_from_file_with_backup(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        match toml::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                let backup = path.with_extension("toml.backup");
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Settings file failed to parse, moving it aside and writing defaults"
                );
                fs::rename(path, &backup).with_context(|| {
                    format!("Failed to back up settings file to {}", backup.display())
                })?;

                let settings = Settings::default();
                Self::write_to_file(path, &settings)?;
                Ok(settings)
            }
        }
    }

    fn write_to_file(path: &Path, settings: &Settings) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }
        let content =
            toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        self.inner.lock().unwrap().clone()
    }

    pub fn update_settings<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.inner.lock().unwrap();
        update(&mut settings);
        Self::write_to_file(&self.settings_path, &settings)
    }

    pub fn save_settings(&self, settings: Settings) -> Result<()> {
        let mut current = self.inner.lock().unwrap();
        *current = settings;
        Self::write_to_file(&self.settings_path, &current)
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}
