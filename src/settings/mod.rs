use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    /// Oscilloscope refresh rate.
    pub refresh_hz: f32,
    /// Samples that must be queued before a tick drains the ring.
    pub min_ready: usize,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            refresh_hz: 30.0,
            min_ready: 64,
        }
    }
}

impl std::fmt::Display for ScopeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Refresh Rate: {} Hz", self.refresh_hz)?;
        writeln!(f, "Minimum Ready Samples: {}", self.min_ready)?;
        Ok(())
    }
}

impl ScopeSettings {
    /// Timer period for the refresh rate. Unusable rates fall back to the default.
    pub fn interval(&self) -> Duration {
        if self.refresh_hz.is_finite() && self.refresh_hz > 0.0 {
            Duration::from_secs_f32(1.0 / self.refresh_hz)
        } else {
            warn!(
                "Invalid scope refresh rate {}, using default",
                self.refresh_hz
            );
            Duration::from_secs_f32(1.0 / Self::default().refresh_hz)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Block size used when rendering files offline.
    pub block_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { block_size: 512 }
    }
}

impl std::fmt::Display for RenderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Block Size: {}", self.block_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scope: ScopeSettings,
    pub render: RenderSettings,
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "------------------------------")?;

        writeln!(f, "Scope Settings:")?;
        writeln!(f, "{}", self.scope)?;

        writeln!(f, "Render Settings:")?;
        writeln!(f, "{}", self.render)?;
        Ok(())
    }
}

impl Settings {
    /// Load from the user config directory, writing defaults on first run.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path();

        if settings_path.exists() {
            Self::load_from(&settings_path)
        } else {
            info!("No settings file found, using defaults");
            let settings = Self::default();
            // Try to save defaults, but don't fail if we can't
            if let Err(e) = settings.save() {
                warn!("Failed to write default settings: {e:#}");
            }
            Ok(settings)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Self = serde_json::from_str(&contents).context("Failed to parse settings")?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure the config directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    fn get_settings_path() -> PathBuf {
        const SETTINGS_FILENAME: &str = "settings.json";

        // Try to use XDG config directory on Linux
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir)
                .join("octadrive")
                .join(SETTINGS_FILENAME)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("octadrive")
                .join(SETTINGS_FILENAME)
        } else {
            // Fallback to current directory
            PathBuf::from(".").join(SETTINGS_FILENAME)
        }
    }
}
