use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use thiserror::Error;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "globe";
const APPLICATION: &str = "globe";
const SETTINGS_FILE: &str = "settings.json";

pub const ROTATION_SPEED_MIN: f32 = 0.0;
pub const ROTATION_SPEED_MAX: f32 = 1.5;
pub const ZOOM_SENSITIVITY_MIN: f32 = 0.5;
pub const ZOOM_SENSITIVITY_MAX: f32 = 2.5;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unable to resolve platform config directory")]
    MissingProjectDirs,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Display language for country names.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ru")]
    Russian,
}

impl Locale {
    /// Pick a locale from a language tag such as `ru_RU.UTF-8` or `en-US`.
    pub fn from_language_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("ru") {
            Locale::Russian
        } else {
            Locale::English
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Russian => "ru",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Locale::English => Locale::Russian,
            Locale::Russian => Locale::English,
        }
    }
}

/// Globe navigation preferences.
///
/// Fields are private so every write goes through a clamping setter; values
/// read from disk are clamped in [`SettingsStore::load`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigationSettings {
    rotation_speed: f32,
    zoom_sensitivity: f32,
    reduced_motion: bool,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            rotation_speed: 0.2,
            zoom_sensitivity: 0.5,
            reduced_motion: false,
        }
    }
}

impl NavigationSettings {
    /// Idle auto-rotation speed in radians per second.
    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn zoom_sensitivity(&self) -> f32 {
        self.zoom_sensitivity
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn set_rotation_speed(&mut self, value: f32) {
        self.rotation_speed = clamp_or(value, ROTATION_SPEED_MIN, ROTATION_SPEED_MAX, 0.2);
    }

    pub fn set_zoom_sensitivity(&mut self, value: f32) {
        self.zoom_sensitivity =
            clamp_or(value, ZOOM_SENSITIVITY_MIN, ZOOM_SENSITIVITY_MAX, 0.5);
    }

    pub fn set_reduced_motion(&mut self, value: bool) {
        self.reduced_motion = value;
    }

    fn sanitized(mut self) -> Self {
        self.set_rotation_speed(self.rotation_speed);
        self.set_zoom_sensitivity(self.zoom_sensitivity);
        self
    }
}

/// NaN has no place to saturate to, so it falls back to the default.
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub navigation: NavigationSettings,
    /// `None` means follow the system language.
    pub locale: Option<Locale>,
    /// Dataset files tried in order before giving up on country outlines.
    pub dataset_paths: Vec<PathBuf>,
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self, SettingsError> {
        let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or(SettingsError::MissingProjectDirs)?;
        let config_dir = dirs.config_dir();
        fs::create_dir_all(config_dir)?;
        let path = config_dir.join(SETTINGS_FILE);
        Ok(Self { path })
    }

    /// Store backed by an explicit file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<UserSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(UserSettings::default());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut settings: UserSettings = serde_json::from_reader(reader)?;
        settings.navigation = settings.navigation.sanitized();
        Ok(settings)
    }

    pub fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, settings)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Clone for SettingsStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
        }
    }
}
