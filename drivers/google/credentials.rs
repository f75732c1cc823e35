//! 凭证解析
//!
//! 查找顺序：凭证文件路径（环境变量）→ 内联 JSON（环境变量 → 选项）。
//! 只读，不访问网络。

use anyhow::{anyhow, Result};
use google_cloud_auth::credentials::CredentialsFile;
use serde_json::{Map, Value};
use std::path::Path;

use crate::options;
use crate::settings::SettingsStore;

pub const BUCKET_OPTION: &str = "mcloud-storage-bucket";
pub const BUCKET_ENV: &[&str] = &["MCLOUD_STORAGE_BUCKET", "MCLOUD_CLOUD_BUCKET"];
pub const CREDENTIALS_FILE_ENV: &[&str] = &["MCLOUD_GOOGLE_CREDENTIALS_FILE"];
pub const CREDENTIALS_OPTION: &str = "mcloud-google-credentials";
pub const CREDENTIALS_ENV: &[&str] = &["MCLOUD_GOOGLE_CREDENTIALS"];

/// 服务账号凭证（原始 JSON 对象）
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials(Map<String, Value>);

impl Credentials {
    /// 解析 JSON；格式错误或空对象视为无凭证
    pub fn parse(json: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) if !map.is_empty() => Some(Self(map)),
            Ok(_) => {
                tracing::warn!("Google credentials are not a JSON object");
                None
            }
            Err(e) => {
                tracing::warn!("Google credentials are not valid JSON: {}", e);
                None
            }
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    /// 转成 SDK 的凭证文件；缺字段时报错
    pub fn to_file(&self) -> Result<CredentialsFile> {
        for name in ["project_id", "client_email", "private_key"] {
            if self.field(name).is_none() {
                return Err(anyhow!("Credentials are missing {}", name));
            }
        }
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| anyhow!("Credentials are not a service account key: {}", e))
    }
}

/// 解析存储桶名称
pub fn resolve_bucket(store: &dyn SettingsStore) -> Option<String> {
    options::option(store, Some(BUCKET_OPTION), BUCKET_ENV).map(|b| b.trim().to_string())
}

/// 解析凭证：文件优先，其次内联 JSON
pub fn resolve_credentials(store: &dyn SettingsStore) -> Option<Credentials> {
    let mut credentials = None;

    if let Some(cred_file) = options::option(store, None, CREDENTIALS_FILE_ENV) {
        credentials = read_credentials_file(Path::new(&cred_file));
    }

    if credentials.is_none() {
        if let Some(inline) = options::option(store, Some(CREDENTIALS_OPTION), CREDENTIALS_ENV) {
            credentials = Credentials::parse(&inline);
        }
    }

    credentials
}

fn read_credentials_file(path: &Path) -> Option<Credentials> {
    if !path.exists() {
        tracing::error!("Credentials file '{}' could not be found.", path.display());
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => Credentials::parse(&content),
        Err(e) => {
            tracing::error!("Credentials file '{}' could not be read: {}", path.display(), e);
            None
        }
    }
}
