use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use dial_compass::{SensorDelay, ViewSize};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    pub dial_width: u32,
    pub dial_height: u32,
    pub marker_width: u32,
    pub marker_height: u32,
    pub sensor_delay: SensorDelaySerde,
    /// Used by the simulated magnetometer
    pub horizontal_field_ut: f32,
    pub vertical_field_ut: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            dial_width: 300,
            dial_height: 300,
            marker_width: 20,
            marker_height: 20,
            sensor_delay: SensorDelaySerde::Ui,
            horizontal_field_ut: 22.0,
            vertical_field_ut: 42.0,
        }
    }
}

impl ScreenConfig {
    pub fn dial_size(&self) -> ViewSize {
        ViewSize::new(self.dial_width, self.dial_height)
    }

    pub fn marker_size(&self) -> ViewSize {
        ViewSize::new(self.marker_width, self.marker_height)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDelaySerde {
    Fastest,
    Game,
    Ui,
    Normal,
}

impl Into<SensorDelay> for SensorDelaySerde {
    fn into(self) -> SensorDelay {
        match self {
            SensorDelaySerde::Fastest => SensorDelay::Fastest,
            SensorDelaySerde::Game => SensorDelay::Game,
            SensorDelaySerde::Ui => SensorDelay::Ui,
            SensorDelaySerde::Normal => SensorDelay::Normal,
        }
    }
}

pub fn read_screen_config<P: AsRef<Path>>(path: P) -> Result<ScreenConfig> {
    let path = path.as_ref();
    let config = read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ScreenConfig = serde_json::from_str(&config)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dial-compass").map(|dirs| dirs.config_dir().join("screen.json"))
}

/// An explicit path must exist. Without one, the per-user config is used
/// when present, and the defaults otherwise.
pub fn load_screen_config(path: Option<&Path>) -> Result<ScreenConfig> {
    if let Some(path) = path {
        return read_screen_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            log::debug!("using config {}", path.display());
            read_screen_config(path)
        }
        _ => Ok(ScreenConfig::default()),
    }
}
