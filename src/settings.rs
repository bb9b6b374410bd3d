//! Portal settings and preferences
//!
//! Persisted separately from scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::REFLEX_ROUND_SECS;
use crate::platform::storage::{KeyValueStore, read_json, write_json};
use crate::tuning::Difficulty;

/// Portal settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Reflex game ===
    /// Difficulty preselected in the picker
    pub default_difficulty: Difficulty,
    /// Round length in seconds
    pub reflex_round_secs: u32,

    // === Sessions ===
    /// Session length after registering
    pub register_session_minutes: u32,
    /// Session length after logging in
    pub login_session_minutes: u32,

    // === HUD ===
    /// Show the scroller's level-up banner
    pub level_banner: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::Easy,
            reflex_round_secs: REFLEX_ROUND_SECS,

            register_session_minutes: 60,
            login_session_minutes: 30,

            level_banner: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "portal_settings";

    /// Round length, never zero
    pub fn effective_round_secs(&self) -> u32 {
        self.reflex_round_secs.max(1)
    }

    /// Load settings, falling back to defaults when absent or corrupt
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match read_json(store, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from storage");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings
    pub fn save(&self, store: &dyn KeyValueStore) {
        match write_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    #[test]
    fn test_load_defaults_when_missing_or_corrupt() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());

        store.set(Settings::STORAGE_KEY, "][").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let store = MemoryStore::new();
        let settings = Settings {
            default_difficulty: Difficulty::Hard,
            login_session_minutes: 10,
            ..Default::default()
        };
        settings.save(&store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{"reflex_round_secs":0}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.reflex_round_secs, 0);
        assert_eq!(settings.effective_round_secs(), 1);
        assert_eq!(settings.login_session_minutes, 30);
    }
}
