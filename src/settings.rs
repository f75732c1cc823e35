//! Persisted settings store / 持久化设置存储
//!
//! Drivers read and write their flags (e.g. the "settings error" flag)
//! through this trait instead of global state.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Named option storage / 选项存储
pub trait SettingsStore: Send + Sync {
    fn get_option(&self, name: &str) -> Option<Value>;

    fn update_option(&self, name: &str, value: Value) -> Result<()>;

    fn delete_option(&self, name: &str) -> Result<()>;

    /// Read a flag, missing or non-truthy values are false / 读取布尔选项
    fn get_bool(&self, name: &str) -> bool {
        match self.get_option(name) {
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
            Some(Value::String(s)) => matches!(s.as_str(), "1" | "true" | "yes" | "on"),
            _ => false,
        }
    }
}

/// In-memory store / 内存存储
#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(self, name: &str, value: Value) -> Self {
        self.values.write().insert(name.to_string(), value);
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get_option(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    fn update_option(&self, name: &str, value: Value) -> Result<()> {
        self.values.write().insert(name.to_string(), value);
        Ok(())
    }

    fn delete_option(&self, name: &str) -> Result<()> {
        self.values.write().remove(name);
        Ok(())
    }
}

/// JSON file backed store, rewritten on every change / JSON文件存储
pub struct JsonFileSettings {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileSettings {
    /// Open (or lazily create) the settings file / 打开设置文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file {:?}", path))?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse settings file {:?}", path))?
            }
        } else {
            Map::new()
        };

        tracing::debug!("Settings loaded from {:?} ({} keys)", path, values.len());
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file {:?}", self.path))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get_option(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    fn update_option(&self, name: &str, value: Value) -> Result<()> {
        let mut values = self.values.write();
        values.insert(name.to_string(), value);
        self.save(&values)
    }

    fn delete_option(&self, name: &str) -> Result<()> {
        let mut values = self.values.write();
        if values.remove(name).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}
