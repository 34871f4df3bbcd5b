//! JSON-backed key/value config with default-filling and error-gated saves

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::constants;

/// Fresh copy of the default config, in the key order used on disk.
///
/// Every call builds a new map, so callers can never mutate a shared template.
pub fn defaults() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("width".to_string(), json!(1024));
    map.insert("height".to_string(), json!(768));
    map.insert("maxed".to_string(), json!(false));
    map.insert("foo".to_string(), json!(true));
    map.insert("bar".to_string(), json!(1));
    map
}

/// Config file plus the in-memory mapping loaded from it
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    values: Map<String, Value>,
    /// Text of the last load failure; while set, `save` does nothing
    error: Option<String>,
}

impl ConfigStore {
    /// Store backed by an explicit file path (nothing is read yet)
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            values: Map::new(),
            error: None,
        }
    }

    /// Store backed by `config.json` inside a user data directory
    pub fn in_dir(user_data_path: &Path) -> Self {
        Self::new(user_data_path.join(constants::config::FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Error text from the most recent load, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Read the file and fill in any missing defaults.
    ///
    /// A missing or blank file counts as an empty mapping. A file that fails
    /// to read or parse is left alone: the error is recorded, saving is
    /// disabled, and memory keeps only what it already had plus defaults.
    pub fn load(&mut self) {
        match self.read_file() {
            Ok(loaded) => {
                debug!(path = %self.path.display(), keys = loaded.len(), "Loaded config");
                self.values.extend(loaded);
                self.error = None;
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to load config file");
                error!(path = %self.path.display(), "The file has been preserved and will not be overwritten");
                self.error = Some(e.to_string());
            }
        }

        let mut added = Vec::new();
        for (key, value) in defaults() {
            if !self.values.contains_key(&key) {
                added.push(key.clone());
                self.values.insert(key, value);
            }
        }
        if !added.is_empty() {
            debug!(added_keys = ?added, "Filled missing config keys with defaults");
        }
    }

    fn read_file(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No config file found, using defaults");
                return Ok(Map::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading config {}", self.path.display()));
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("config root must be a JSON object, found {}", kind_of(&other)),
        }
    }

    /// Write the config back to disk.
    ///
    /// Does nothing if the last load failed. Only default keys are written,
    /// in default order; unknown keys are dropped. Failures are logged.
    pub fn save(&self) {
        if let Some(err) = &self.error {
            warn!(path = %self.path.display(), load_error = %err, "Not saving config: last load failed");
            return;
        }

        match self.write_file() {
            Ok(()) => info!(path = %self.path.display(), "Saved config"),
            Err(e) => error!(path = %self.path.display(), error = ?e, "Failed to save config"),
        }
    }

    fn write_file(&self) -> Result<()> {
        let mut out = defaults();
        for (key, value) in out.iter_mut() {
            if let Some(current) = self.values.get(key) {
                *value = current.clone();
            }
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        out.serialize(&mut serializer)
            .context("Failed to serialize config to JSON")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        fs::write(&self.path, buf)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;
        Ok(())
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn width(&self) -> u32 {
        self.u32_or_default("width")
    }

    pub fn height(&self) -> u32 {
        self.u32_or_default("height")
    }

    pub fn maxed(&self) -> bool {
        self.bool_or_default("maxed")
    }

    pub fn foo(&self) -> bool {
        self.bool_or_default("foo")
    }

    /// Selected Bar option (1 or 2)
    pub fn bar(&self) -> i64 {
        self.int_or_default("bar")
    }

    fn int_or_default(&self, key: &str) -> i64 {
        match self.values.get(key).and_then(Value::as_i64) {
            Some(v) if v >= 0 => v,
            _ => {
                let fallback = defaults().get(key).and_then(Value::as_i64).unwrap_or_default();
                if self.values.contains_key(key) {
                    warn!(key, fallback, "Config value is not a valid integer, using default");
                }
                fallback
            }
        }
    }

    fn u32_or_default(&self, key: &str) -> u32 {
        let value = self.int_or_default(key);
        u32::try_from(value).unwrap_or_else(|_| {
            let fallback = defaults()
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or_default();
            warn!(key, value, fallback, "Config value is out of range, using default");
            fallback
        })
    }

    fn bool_or_default(&self, key: &str) -> bool {
        match self.values.get(key).and_then(Value::as_bool) {
            Some(v) => v,
            None => {
                let fallback = defaults().get(key).and_then(Value::as_bool).unwrap_or_default();
                if self.values.contains_key(key) {
                    warn!(key, fallback, "Config value is not a boolean, using default");
                }
                fallback
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
