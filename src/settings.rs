use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

pub const THEMES: [&str; 3] = ["default", "soft", "compact"];

/// A student's preferences. Values are stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    pub theme: String,
    pub grade: String,
    pub skills: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            grade: "7th Grade".to_string(),
            skills: Vec::new(),
        }
    }
}

impl Settings {
    /// Skills are split on `,` and the pieces are kept untrimmed.
    pub fn from_input(theme: &str, grade: &str, raw_skills: &str) -> Self {
        Self {
            theme: theme.to_string(),
            grade: grade.to_string(),
            skills: raw_skills.split(',').map(String::from).collect(),
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "theme={}, grade={}, skills={:?}",
            self.theme, self.grade, self.skills
        )
    }
}

/// Settings for every chat, each overwritten wholesale on save.
#[derive(Debug, Default)]
pub struct SettingsStore {
    by_chat: Mutex<HashMap<i64, Settings>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, chat: i64, theme: &str, grade: &str, raw_skills: &str) -> Settings {
        let settings = Settings::from_input(theme, grade, raw_skills);
        self.by_chat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat, settings.clone());
        log::info!("Saved settings for chat {}: {}", chat, settings);
        settings
    }

    pub fn read(&self, chat: i64) -> Settings {
        self.by_chat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat)
            .cloned()
            .unwrap_or_default()
    }
}
