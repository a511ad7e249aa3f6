use crate::{AppenderError, PreferenceStore, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Preferences kept in memory only; hosts that persist elsewhere wrap this.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, bool>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn add_preference(&self, key: &str, default: bool) {
        self.values.write().entry(key.to_string()).or_insert(default);
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().get(key).copied()
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Preferences persisted as one flat JSON object, rewritten on every change.
#[derive(Debug)]
pub struct JsonPreferenceFile {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonPreferenceFile {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                _ => {
                    return Err(AppenderError::Preference(format!(
                        "{} does not hold a JSON object",
                        path.display()
                    )))
                }
            }
        } else {
            debug!("No preference file at {}, starting empty", path.display());
            Map::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceFile {
    fn add_preference(&self, key: &str, default: bool) {
        let mut values = self.values.write();
        if !values.contains_key(key) {
            values.insert(key.to_string(), Value::Bool(default));
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        let values = self.values.read();
        let value = values.get(key)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                warn!("Preference {} is not a boolean: {}", key, value);
                None
            }
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), Value::Bool(value));
        self.persist(&values)
    }
}
