//! Runtime settings.
//!
//! The two engine model names, adjustable over REST without a restart.
//! Persisted as `settings.json` in the data directory; see
//! [`crate::persist::DocumentStore::load_settings`].

use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub director_model: String,
    pub narrator_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            director_model: DEFAULT_MODEL.to_string(),
            narrator_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Partial update from the settings endpoint. Absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub director_model: Option<String>,
    pub narrator_model: Option<String>,
}

impl Settings {
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(model) = update.director_model {
            self.director_model = model;
        }
        if let Some(model) = update.narrator_model {
            self.narrator_model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.director_model, "gpt-4o-mini");
        assert_eq!(settings.narrator_model, "gpt-4o-mini");
    }

    #[test]
    fn test_partial_update() {
        let mut settings = Settings::default();
        settings.apply(SettingsUpdate {
            director_model: Some("gpt-4o".to_string()),
            narrator_model: None,
        });
        assert_eq!(settings.director_model, "gpt-4o");
        assert_eq!(settings.narrator_model, "gpt-4o-mini");
    }

    #[test]
    fn test_update_decodes_partial_json() {
        let update: SettingsUpdate =
            serde_json::from_str(r#"{"narrator_model": "gpt-4o"}"#).unwrap();
        assert!(update.director_model.is_none());
        assert_eq!(update.narrator_model.as_deref(), Some("gpt-4o"));
    }
}
