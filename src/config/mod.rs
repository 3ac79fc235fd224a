use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crop::CropSettings;
use crate::viewport::ZoomAnchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "portrait-gallery";
const APP_CONFIG_FILE: &str = "config.json";
const FALLBACK_DATA_DIR: &str = "portrait_gallery_data";

/// Settings from `config.json`; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub preview_size: Option<u32>,
    #[serde(default)]
    pub crop_size: Option<u32>,
    #[serde(default)]
    pub portrait_size: Option<u32>,
    #[serde(default)]
    pub zoom_anchor: Option<ZoomAnchor>,
}

impl AppConfig {
    /// Crop canvas metrics, ignoring zero values.
    pub fn crop_settings(&self) -> CropSettings {
        let defaults = CropSettings::default();
        let positive = |value: Option<u32>| value.filter(|value| *value > 0);
        CropSettings {
            preview_size: positive(self.preview_size).unwrap_or(defaults.preview_size),
            crop_size: positive(self.crop_size).unwrap_or(defaults.crop_size),
            portrait_size: positive(self.portrait_size).unwrap_or(defaults.portrait_size),
            zoom_anchor: self.zoom_anchor.unwrap_or(defaults.zoom_anchor),
        }
    }

    /// Configured data directory, else the XDG data home, else a local folder.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = self.data_dir.as_ref() {
            return dir.clone();
        }
        let (xdg_data_home, home) = data_env_dirs();
        default_data_dir(xdg_data_home.as_deref(), home.as_deref())
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn data_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = xdg_root(xdg_config_home, home, ".config")?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn default_data_dir(xdg_data_home: Option<&Path>, home: Option<&Path>) -> PathBuf {
    match xdg_root(xdg_data_home, home, ".local/share") {
        Ok(root) => root.join(APP_DIR),
        Err(ConfigPathError::MissingHomeDirectory) => {
            tracing::warn!("HOME is unset; keeping gallery data in the working directory");
            PathBuf::from(FALLBACK_DATA_DIR)
        }
    }
}

fn xdg_root(
    xdg_home: Option<&Path>,
    home: Option<&Path>,
    home_relative: &str,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(home_relative))
}
