use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration for the bot, loaded from environment variables
/// (with optional `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub bot_name: String,

    // Catalog endpoints
    pub catalog_url: String,
    pub catalog_public_url: String,
    pub relay_url: Option<String>,
    pub media_url: String,

    // HTTP timeouts
    pub metadata_timeout: Duration,
    pub download_timeout: Option<Duration>,

    // State files
    pub delivery_cache_file: PathBuf,
    pub settings_file: PathBuf,

    // Analytics
    pub analytics_log_path: PathBuf,
    pub analytics_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let bot_name = env_str("BOT_NAME").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_NAME environment variable is required".to_string())
        })?;

        let catalog_url = env_str("CATALOG_URL")
            .and_then(non_empty)
            .map(strip_trailing_slash)
            .ok_or_else(|| {
                Error::Config("CATALOG_URL environment variable is required".to_string())
            })?;

        // The public URL is handed out to users in oversized-file captions;
        // it defaults to the internal one.
        let catalog_public_url = env_str("CATALOG_PUBLIC_URL")
            .and_then(non_empty)
            .map(strip_trailing_slash)
            .unwrap_or_else(|| catalog_url.clone());

        let relay_url = env_str("RELAY_URL")
            .and_then(non_empty)
            .map(strip_trailing_slash);

        let media_url = env_str("MEDIA_URL")
            .and_then(non_empty)
            .map(strip_trailing_slash)
            .unwrap_or_else(|| "https://flibusta.is".to_string());

        // Timeouts: metadata calls are short, book downloads may stream for a
        // while (0 disables the overall download deadline).
        let metadata_timeout =
            Duration::from_millis(env_u64("METADATA_TIMEOUT_MS").unwrap_or(15_000));
        let download_timeout = match env_u64("DOWNLOAD_TIMEOUT_MS").unwrap_or(0) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        // State files
        let delivery_cache_file = PathBuf::from(
            env_str("DELIVERY_CACHE_FILE")
                .unwrap_or("/tmp/bookbot-delivery-cache.json".to_string()),
        );
        let settings_file = PathBuf::from(
            env_str("SETTINGS_FILE").unwrap_or("/tmp/bookbot-settings.json".to_string()),
        );

        // Analytics logging
        let analytics_log_path = PathBuf::from(
            env_str("ANALYTICS_LOG_PATH").unwrap_or("/tmp/bookbot-analytics.log".to_string()),
        );
        let analytics_log_json = env_bool("ANALYTICS_LOG_JSON").unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            bot_name,
            catalog_url,
            catalog_public_url,
            relay_url,
            media_url,
            metadata_timeout,
            download_timeout,
            delivery_cache_file,
            settings_file,
            analytics_log_path,
            analytics_log_json,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn strip_trailing_slash(s: String) -> String {
    s.trim_end_matches('/').to_string()
}
