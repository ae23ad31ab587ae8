//! Light/dark theme preference.

use crate::logging::debug;
use crate::state::KeyValueStore;

/// Page color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Name the theme is stored and applied under.
    pub const fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parses a stored theme name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// The other theme.
    pub const fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Trait for applying a theme to the host page.
pub trait ThemeSink {
    fn apply_theme(&mut self, theme: Theme);
}

/// Persisted theme preference.
///
/// Unlike the display modes the theme is stored by name, not by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    theme: Theme,
    storage_key: &'static str,
}

impl ThemeState {
    /// Loads the stored theme. Without a valid stored name the host's color
    /// scheme preference decides.
    pub fn load<S: KeyValueStore>(store: &S, storage_key: &'static str, prefers_dark: bool) -> Self {
        let fallback = if prefers_dark { Theme::Dark } else { Theme::Light };
        let theme = store
            .get(storage_key)
            .and_then(|name| Theme::from_name(&name))
            .unwrap_or(fallback);

        Self { theme, storage_key }
    }

    /// Applies and persists the current theme.
    pub fn apply<S: KeyValueStore, T: ThemeSink>(&self, store: &mut S, sink: &mut T) {
        sink.apply_theme(self.theme);
        store.set(self.storage_key, self.theme.as_str());
    }

    /// Switches to the other theme, applies and persists it.
    pub fn toggle<S: KeyValueStore, T: ThemeSink>(&mut self, store: &mut S, sink: &mut T) -> Theme {
        self.theme = self.theme.toggled();
        debug!("theme now {}", self.theme.as_str());
        self.apply(store, sink);
        self.theme
    }

    pub fn current(&self) -> Theme {
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StoredValue;

    #[derive(Default)]
    struct Single {
        value: Option<StoredValue>,
    }

    impl KeyValueStore for Single {
        fn get(&self, _key: &str) -> Option<StoredValue> {
            self.value.clone()
        }

        fn set(&mut self, _key: &str, value: &str) {
            self.value = StoredValue::try_from(value).ok();
        }
    }

    #[derive(Default)]
    struct LastTheme(Option<Theme>);

    impl ThemeSink for LastTheme {
        fn apply_theme(&mut self, theme: Theme) {
            self.0 = Some(theme);
        }
    }

    #[test]
    fn stored_name_wins_over_preference() {
        let store = Single {
            value: StoredValue::try_from("light").ok(),
        };
        assert_eq!(ThemeState::load(&store, "theme", true).current(), Theme::Light);
    }

    #[test]
    fn unknown_names_fall_back_to_preference() {
        let store = Single {
            value: StoredValue::try_from("sepia").ok(),
        };
        assert_eq!(ThemeState::load(&store, "theme", true).current(), Theme::Dark);
        assert_eq!(ThemeState::load(&Single::default(), "theme", false).current(), Theme::Light);
    }

    #[test]
    fn toggle_applies_and_persists() {
        let mut store = Single::default();
        let mut sink = LastTheme::default();
        let mut state = ThemeState::load(&store, "theme", false);

        assert_eq!(state.toggle(&mut store, &mut sink), Theme::Dark);
        assert_eq!(sink.0, Some(Theme::Dark));
        assert_eq!(store.value.as_deref(), Some("dark"));
    }
}
