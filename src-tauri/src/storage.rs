use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const USERS_KEY: &str = "users";
pub const HISTORY_KEY: &str = "queryHistory";

pub const SCHEMA_VERSION: u32 = 1;

/// String-keyed storage for serialized records.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.values.lock()?.remove(key);
        Ok(())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Outcome of reading a record that may be absent or unreadable.
#[derive(Debug, PartialEq)]
pub enum Loaded<T> {
    Missing,
    Corrupt(String),
    Value(T),
}

impl<T> Loaded<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Corrupt(_) => None,
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let versioned = value
        .as_object()
        .is_some_and(|obj| obj.len() == 2 && obj.contains_key("version") && obj.contains_key("data"));

    if versioned {
        let envelope: Envelope<T> = serde_json::from_value(value).map_err(|e| e.to_string())?;
        if envelope.version > SCHEMA_VERSION {
            return Err(format!(
                "schema version {} is newer than supported version {SCHEMA_VERSION}",
                envelope.version
            ));
        }
        return Ok(envelope.data);
    }

    // Records written before the envelope existed.
    serde_json::from_value(value).map_err(|e| e.to_string())
}

pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> AppResult<Loaded<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(Loaded::Missing);
    };
    Ok(match decode(&raw) {
        Ok(value) => Loaded::Value(value),
        Err(reason) => Loaded::Corrupt(reason),
    })
}

/// Reads `key`, treating absent, corrupt and unreadable data alike as the default.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match load(store, key) {
        Ok(Loaded::Value(value)) => value,
        Ok(Loaded::Missing) => T::default(),
        Ok(Loaded::Corrupt(reason)) => {
            tracing::warn!(key, %reason, "discarding unreadable stored value");
            T::default()
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read stored value");
            T::default()
        }
    }
}

pub fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()> {
    let content = serde_json::to_string_pretty(&EnvelopeRef {
        version: SCHEMA_VERSION,
        data: value,
    })?;
    store.set(key, &content)?;
    tracing::debug!(key, bytes = content.len(), "persisted value");
    Ok(())
}
