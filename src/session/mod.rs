//! Session persistence for the form state.
//!
//! Settings and ladder are stored as two JSON blobs, each wrapped with an
//! expiry timestamp. Anything missing, expired or unreadable loads as `None`
//! and the caller falls back to computed defaults.

pub mod file;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::settings::BotSettings;
use crate::constants::{ENTRIES_KEY, SESSION_TTL_SECS, SETTINGS_KEY};
use crate::ladder::types::EntryStep;

pub use file::FileSessionStore;

/// Key-value capability the form persists through.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn clear(&mut self, key: &str) -> Result<()>;
}

/// In-process store. Used by the interactive creator and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// Restored session contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub settings: BotSettings,
    /// Empty when the ladder blob is missing or unreadable.
    pub entries: Vec<EntryStep>,
}

fn read_blob<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
    now: DateTime<Utc>,
) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str::<Envelope<T>>(&raw) {
        Ok(envelope) if envelope.expires_at > now => Some(envelope.value),
        Ok(_) => {
            log::info!("Session entry '{}' expired", key);
            None
        }
        Err(e) => {
            log::warn!("Malformed session entry '{}': {}. Ignoring.", key, e);
            None
        }
    }
}

fn write_blob<T: Serialize>(
    store: &mut dyn SessionStore,
    key: &str,
    value: &T,
    now: DateTime<Utc>,
) -> Result<()> {
    let envelope = Envelope {
        value,
        expires_at: now + Duration::seconds(SESSION_TTL_SECS),
    };
    store.set(key, serde_json::to_string(&envelope)?)
}

/// Loads settings and ladder. Expired or malformed settings clear the session.
pub fn load_session(store: &mut dyn SessionStore, now: DateTime<Utc>) -> Option<SessionSnapshot> {
    let Some(settings) = read_blob::<BotSettings>(&*store, SETTINGS_KEY, now) else {
        if store.get(SETTINGS_KEY).is_some() {
            if let Err(e) = clear_session(store) {
                log::warn!("Failed to clear stale session: {}", e);
            }
        }
        return None;
    };
    let entries = read_blob::<Vec<EntryStep>>(&*store, ENTRIES_KEY, now).unwrap_or_default();
    Some(SessionSnapshot { settings, entries })
}

pub fn save_session(
    store: &mut dyn SessionStore,
    settings: &BotSettings,
    entries: &[EntryStep],
    now: DateTime<Utc>,
) -> Result<()> {
    write_blob(store, SETTINGS_KEY, settings, now)?;
    write_blob(store, ENTRIES_KEY, &entries, now)?;
    Ok(())
}

pub fn clear_session(store: &mut dyn SessionStore) -> Result<()> {
    store.clear(SETTINGS_KEY)?;
    store.clear(ENTRIES_KEY)?;
    Ok(())
}
