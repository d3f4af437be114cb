use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::UserId, Result};

/// Catalog language codes the bot lets users filter by, with display names.
pub const KNOWN_LANGS: [(&str, &str); 3] = [
    ("ru", "Русский"),
    ("uk", "Украинский"),
    ("be", "Белорусский"),
];

fn default_true() -> bool {
    true
}

/// Per-user preferences. New users start with Russian only.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSettings {
    pub user_id: i64,
    #[serde(default = "default_true")]
    pub allow_ru: bool,
    #[serde(default)]
    pub allow_uk: bool,
    #[serde(default)]
    pub allow_be: bool,
    #[serde(default)]
    pub beta_testing: bool,
}

impl UserSettings {
    pub fn default_for(user_id: UserId) -> Self {
        Self {
            user_id: user_id.0,
            allow_ru: true,
            allow_uk: false,
            allow_be: false,
            beta_testing: false,
        }
    }

    pub fn allows(&self, code: &str) -> bool {
        match code {
            "ru" => self.allow_ru,
            "uk" => self.allow_uk,
            "be" => self.allow_be,
            _ => false,
        }
    }

    /// Enabled language codes in a stable order, for catalog queries.
    pub fn allowed_langs(&self) -> Vec<String> {
        KNOWN_LANGS
            .iter()
            .filter(|(code, _)| self.allows(code))
            .map(|(code, _)| code.to_string())
            .collect()
    }

    /// Sets one language filter. Explicit on/off instead of a toggle, so a
    /// stale keyboard press cannot flip the setting the wrong way. Returns
    /// false for codes the bot does not know, leaving the settings untouched.
    pub fn set_lang(&mut self, code: &str, enabled: bool) -> bool {
        match code {
            "ru" => self.allow_ru = enabled,
            "uk" => self.allow_uk = enabled,
            "be" => self.allow_be = enabled,
            _ => return false,
        }
        true
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Unknown users get the defaults without creating a record.
    async fn get(&self, user_id: UserId) -> Result<UserSettings>;
    async fn update(&self, settings: &UserSettings) -> Result<()>;
}

/// JSON-file-backed store, written through on every update.
pub struct FileSettingsStore {
    path: PathBuf,
    entries: Mutex<HashMap<i64, UserSettings>>,
}

impl FileSettingsStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(txt) if !txt.trim().is_empty() => match serde_json::from_str(&txt) {
                Ok(map) => map,
                Err(e) => {
                    eprintln!("[SETTINGS] ignoring unreadable {}: {e}", path.display());
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<i64, UserSettings>) -> Result<()> {
        let txt = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, txt)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, user_id: UserId) -> Result<UserSettings> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&user_id.0)
            .cloned()
            .unwrap_or_else(|| UserSettings::default_for(user_id)))
    }

    async fn update(&self, settings: &UserSettings) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(settings.user_id, settings.clone());
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(std::time::Duration::from_secs(0))
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    #[test]
    fn defaults_enable_russian_only() {
        let settings = UserSettings::default_for(UserId(5));
        assert_eq!(settings.allowed_langs(), vec!["ru".to_string()]);
        assert!(!settings.beta_testing);
    }

    #[test]
    fn set_lang_keeps_catalog_order() {
        let mut settings = UserSettings::default_for(UserId(5));
        assert!(settings.set_lang("be", true));
        assert!(settings.set_lang("uk", true));
        assert_eq!(
            settings.allowed_langs(),
            vec!["ru".to_string(), "uk".to_string(), "be".to_string()]
        );

        assert!(settings.set_lang("ru", false));
        assert!(!settings.allows("ru"));
        // Setting an enabled language on again is a no-op, not a flip.
        assert!(settings.set_lang("uk", true));
        assert!(settings.allows("uk"));
        assert!(!settings.set_lang("fr", true));
    }

    #[tokio::test]
    async fn unknown_user_gets_defaults() {
        let store = FileSettingsStore::load(tmp_file("bookbot-settings-default-test"));
        let settings = store.get(UserId(42)).await.unwrap();
        assert_eq!(settings, UserSettings::default_for(UserId(42)));
    }

    #[tokio::test]
    async fn update_persists_across_reload() {
        let path = tmp_file("bookbot-settings-reload-test");
        {
            let store = FileSettingsStore::load(&path);
            let mut settings = store.get(UserId(42)).await.unwrap();
            settings.set_lang("uk", true);
            settings.beta_testing = true;
            store.update(&settings).await.unwrap();
        }

        let store = FileSettingsStore::load(&path);
        let settings = store.get(UserId(42)).await.unwrap();
        assert!(settings.allows("uk"));
        assert!(settings.beta_testing);

        // Other users are unaffected.
        let other = store.get(UserId(43)).await.unwrap();
        assert!(!other.allows("uk"));
    }
}
