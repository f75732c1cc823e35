//! Environment-then-option lookup / 环境变量优先的选项读取

use serde_json::Value;

use crate::settings::SettingsStore;

/// Resolve a value from env vars (in order), then from the stored option.
/// Empty values are skipped. / 先查环境变量，再查存储的选项
pub fn option(store: &dyn SettingsStore, name: Option<&str>, env_names: &[&str]) -> Option<String> {
    for env_name in env_names {
        if let Ok(value) = std::env::var(env_name) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }

    let value = store.get_option(name?)?;
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s,
        other => other.to_string(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
