use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    utils::{iso_timestamp_utc, truncate_text},
    Result,
};

const ANALYTICS_MAX_TEXT: usize = 200;

/// One usage event, written as a line to the analytics log.
#[derive(Clone, Debug, Serialize)]
pub struct AnalyticsEvent {
    pub timestamp: String,
    pub event: String,
    pub user_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl AnalyticsEvent {
    pub fn command(event: &str, user_id: i64) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            user_id,
            query: None,
        }
    }

    pub fn search(event: &str, user_id: i64, query: &str) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            user_id,
            query: Some(query.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnalyticsLogger {
    path: PathBuf,
    json: bool,
}

impl AnalyticsLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort variant: a broken analytics log must never take a handler
    /// down with it.
    pub fn record(&self, event: AnalyticsEvent) {
        if let Err(e) = self.write(event) {
            eprintln!("[ANALYTICS] failed to write event: {e}");
        }
    }

    pub fn write(&self, mut event: AnalyticsEvent) -> Result<()> {
        // Queries come straight from users; cap them before they hit disk.
        if let Some(q) = &event.query {
            event.query = Some(truncate_text(q, ANALYTICS_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        match &event.query {
            Some(q) => writeln!(
                file,
                "{} {} user={} query={q}",
                event.timestamp, event.event, event.user_id
            )?,
            None => writeln!(
                file,
                "{} {} user={}",
                event.timestamp, event.event, event.user_id
            )?,
        }
        Ok(())
    }
}
