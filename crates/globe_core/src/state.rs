//! Shared application state read by the controllers and written by the
//! hover picker.

use settings::{Locale, NavigationSettings, UserSettings};

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoveredCountry {
    pub iso_code: String,
    pub name: String,
}

/// Where the globe core reads its configuration and publishes its output.
pub trait StateSink {
    fn navigation(&self) -> &NavigationSettings;

    fn locale(&self) -> Locale;

    /// Called once per frame with the current hover result.
    fn set_hovered_country(&mut self, hovered: Option<HoveredCountry>);
}

/// In-memory state container backed by the persisted user settings.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    settings: UserSettings,
    locale: Locale,
    hovered: Option<HoveredCountry>,
}

impl AppState {
    /// State seeded from persisted settings. `fallback_locale` is used when
    /// the settings do not pin a locale.
    pub fn new(settings: UserSettings, fallback_locale: Locale) -> Self {
        let locale = settings.locale.unwrap_or(fallback_locale);
        Self {
            settings,
            locale,
            hovered: None,
        }
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn hovered_country(&self) -> Option<&HoveredCountry> {
        self.hovered.as_ref()
    }

    pub fn set_rotation_speed(&mut self, value: f32) {
        self.settings.navigation.set_rotation_speed(value);
    }

    pub fn set_zoom_sensitivity(&mut self, value: f32) {
        self.settings.navigation.set_zoom_sensitivity(value);
    }

    pub fn set_reduced_motion(&mut self, value: bool) {
        self.settings.navigation.set_reduced_motion(value);
    }

    /// Switch the display locale and pin it in the settings. Returns whether
    /// the locale actually changed.
    pub fn set_locale(&mut self, locale: Locale) -> bool {
        self.settings.locale = Some(locale);
        if self.locale == locale {
            return false;
        }
        self.locale = locale;
        true
    }
}

impl StateSink for AppState {
    fn navigation(&self) -> &NavigationSettings {
        &self.settings.navigation
    }

    fn locale(&self) -> Locale {
        self.locale
    }

    fn set_hovered_country(&mut self, hovered: Option<HoveredCountry>) {
        if self.hovered != hovered {
            tracing::trace!(?hovered, "hovered country changed");
        }
        self.hovered = hovered;
    }
}
