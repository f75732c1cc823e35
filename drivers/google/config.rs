//! Google Cloud Storage 端点配置

use serde::{Deserialize, Serialize};

/// GCS 端点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// JSON API 根地址（/storage/v1 与 /upload/storage/v1 的前缀）
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,
    /// 下载/签名地址前缀，gs:// 会被替换成它
    #[serde(default = "default_download_url")]
    pub download_url: String,
    /// 覆盖凭证中的 token_uri（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_download_url() -> String {
    "https://storage.googleapis.com".to_string()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            storage_endpoint: default_storage_endpoint(),
            download_url: default_download_url(),
            token_uri: None,
        }
    }
}

impl GoogleConfig {
    /// 所有端点指向同一个服务（测试替身）
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            storage_endpoint: base.to_string(),
            download_url: format!("{}/download", base),
            token_uri: Some(format!("{}/token", base)),
        }
    }
}
