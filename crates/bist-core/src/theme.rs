//! Light/dark theme preference.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{KeyValueStore, StorageError, THEME_KEY};
use crate::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ValidationError::InvalidTheme {
                value: input.to_owned(),
            }),
        }
    }
}

/// Environment hint used when nothing is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorSchemeHint {
    /// Explicit `BIST_COLOR_SCHEME` value.
    pub explicit: Option<String>,
    /// Terminal `COLORFGBG` value (`fg;bg`).
    pub colorfgbg: Option<String>,
}

impl ColorSchemeHint {
    pub fn from_env() -> Self {
        Self {
            explicit: std::env::var("BIST_COLOR_SCHEME").ok(),
            colorfgbg: std::env::var("COLORFGBG").ok(),
        }
    }

    /// `None` when the environment expresses no preference.
    pub fn preferred(&self) -> Option<Theme> {
        if let Some(theme) = self.explicit.as_deref().and_then(|v| v.parse().ok()) {
            return Some(theme);
        }

        // Background colour index is the last field; 0-6 and 8 are dark in the xterm palette.
        let background = self.colorfgbg.as_deref()?.rsplit(';').next()?;
        let index: u8 = background.trim().parse().ok()?;
        Some(if index <= 6 || index == 8 {
            Theme::Dark
        } else {
            Theme::Light
        })
    }
}

/// Persisted theme with environment fallback.
pub struct ThemePreference<'a> {
    store: &'a dyn KeyValueStore,
    hint: ColorSchemeHint,
}

impl<'a> ThemePreference<'a> {
    pub fn new(store: &'a dyn KeyValueStore, hint: ColorSchemeHint) -> Self {
        Self { store, hint }
    }

    /// Stored value wins, then the environment hint, then light.
    pub fn current(&self) -> Result<Theme, StorageError> {
        if let Some(stored) = self.stored()? {
            return Ok(stored);
        }
        Ok(self.hint.preferred().unwrap_or_default())
    }

    pub fn set(&self, theme: Theme) -> Result<(), StorageError> {
        debug!(theme = theme.as_str(), "persisting theme");
        let raw = serde_json::to_string(&theme).map_err(|source| StorageError::Encode {
            key: THEME_KEY.to_owned(),
            source,
        })?;
        self.store.set(THEME_KEY, &raw)
    }

    /// Flip the current theme and persist the result.
    pub fn toggle(&self) -> Result<Theme, StorageError> {
        let next = self.current()?.toggled();
        self.set(next)?;
        Ok(next)
    }

    fn stored(&self) -> Result<Option<Theme>, StorageError> {
        let Some(raw) = self.store.get(THEME_KEY)? else {
            return Ok(None);
        };
        // Unrecognised values are ignored rather than treated as an error.
        Ok(raw.trim().trim_matches('"').parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn hint(explicit: Option<&str>, colorfgbg: Option<&str>) -> ColorSchemeHint {
        ColorSchemeHint {
            explicit: explicit.map(str::to_owned),
            colorfgbg: colorfgbg.map(str::to_owned),
        }
    }

    #[test]
    fn defaults_to_light_without_preference() {
        let store = MemoryStore::new();
        let preference = ThemePreference::new(&store, ColorSchemeHint::default());
        assert_eq!(preference.current().expect("read"), Theme::Light);
    }

    #[test]
    fn environment_hint_applies_when_nothing_stored() {
        let store = MemoryStore::new();
        assert_eq!(
            ThemePreference::new(&store, hint(Some("dark"), None))
                .current()
                .expect("read"),
            Theme::Dark
        );
        assert_eq!(
            ThemePreference::new(&store, hint(None, Some("15;0")))
                .current()
                .expect("read"),
            Theme::Dark
        );
        assert_eq!(
            ThemePreference::new(&store, hint(None, Some("0;15")))
                .current()
                .expect("read"),
            Theme::Light
        );
    }

    #[test]
    fn stored_value_beats_environment() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "light").expect("seed");

        let preference = ThemePreference::new(&store, hint(Some("dark"), None));
        assert_eq!(preference.current().expect("read"), Theme::Light);
    }

    #[test]
    fn toggle_flips_and_persists() {
        let store = MemoryStore::new();
        let preference = ThemePreference::new(&store, ColorSchemeHint::default());

        assert_eq!(preference.toggle().expect("toggle"), Theme::Dark);
        assert_eq!(
            store.get(THEME_KEY).expect("read").as_deref(),
            Some("\"dark\"")
        );
        assert_eq!(preference.toggle().expect("toggle"), Theme::Light);
    }

    #[test]
    fn stored_theme_is_json_text() {
        let store = MemoryStore::new();
        ThemePreference::new(&store, ColorSchemeHint::default())
            .set(Theme::Dark)
            .expect("persist");

        let raw = store.get(THEME_KEY).expect("read").expect("stored");
        let decoded: Theme = serde_json::from_str(&raw).expect("valid JSON");
        assert_eq!(decoded, Theme::Dark);
    }

    #[test]
    fn bare_stored_word_is_still_understood() {
        let store = MemoryStore::new();
        store.set(THEME_KEY, "dark").expect("seed");

        let preference = ThemePreference::new(&store, ColorSchemeHint::default());
        assert_eq!(preference.current().expect("read"), Theme::Dark);
    }

    #[test]
    fn rejects_unknown_theme_names() {
        let err = "sepia".parse::<Theme>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTheme { .. }));
    }
}
