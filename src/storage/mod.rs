use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::notice::NoticeSink;
use crate::scripts::ScriptRegistry;
use crate::settings::SettingsStore;

pub mod acl;
pub mod error;
pub mod manager;

pub use acl::{Acl, AclMap};
pub use error::{StorageError, StorageResult};
pub use manager::{DriverBox, DriverFactory, StorageManager};

/// Image pixel dimensions / 图片像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Read-only projection of object metadata / 对象信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub key: String,
    /// Signed access URL / 签名访问地址
    pub url: String,
    pub size: u64,
    pub mime_type: String,
    /// Only populated for images / 仅图片有值
    pub dimensions: Option<ImageSize>,
}

/// Direct upload descriptor handed to the browser uploader / 直传信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadInfo {
    pub key: String,
    pub url: String,
    /// Provider ACL token / 服务商ACL令牌
    pub acl: String,
    pub method: String,
    /// Headers the browser must send unchanged for the signature to match
    pub headers: BTreeMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

/// Driver configuration readiness / 驱动配置状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    /// Credentials or bucket missing / 未配置
    Unconfigured,
    /// Configured, never validated in this process / 已配置未验证
    Unvalidated,
    /// Last validation succeeded / 验证通过
    Valid,
    /// Last validation failed (persisted) / 验证失败
    Invalid,
}

/// Collaborators injected into every driver / 驱动依赖
#[derive(Clone)]
pub struct DriverContext {
    pub settings: Arc<dyn SettingsStore>,
    pub notices: Arc<dyn NoticeSink>,
    pub scripts: Arc<dyn ScriptRegistry>,
    pub config: AppConfig,
}

/// Storage driver interface / 存储驱动接口
///
/// One implementation per provider. Every object operation fails with
/// `StorageError::InvalidStorageSettings` when the driver has no client.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Driver identifier, e.g. "google" / 驱动标识
    fn identifier(&self) -> &'static str;

    /// Display name / 驱动名称
    fn name(&self) -> &'static str;

    /// Whether browsers may upload straight to the bucket / 是否支持直传
    fn supports_direct_uploads(&self) -> bool;

    /// Re-check credentials and bucket, persisting the outcome / 验证设置
    async fn validate_settings(&self) -> StorageResult<DriverStatus>;

    /// Whether the driver is usable; posts a notice when it is not / 是否启用
    fn enabled(&self) -> bool;

    /// Current state without side effects / 当前状态
    fn status(&self) -> DriverStatus;

    fn bucket(&self) -> &str;

    fn region(&self) -> Option<&str> {
        None
    }

    /// Re-apply an ACL to an existing object / 重新应用ACL
    async fn insure_acl(&self, key: &str, acl: Acl) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Server-side copy inside the bucket / 服务端复制
    async fn copy(
        &self,
        source_key: &str,
        dest_key: &str,
        acl: Acl,
        mime_type: Option<&str>,
        cache_control: Option<&str>,
        expires: Option<&str>,
    ) -> StorageResult<()>;

    /// Upload a local file, returns its public URL / 上传本地文件
    async fn upload(
        &self,
        key: &str,
        file_name: &Path,
        acl: Acl,
        cache_control: Option<&str>,
        expires: Option<&str>,
    ) -> StorageResult<String>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Size, type, signed URL and image dimensions / 文件信息
    async fn info(&self, key: &str) -> StorageResult<FileInfo>;

    /// Time-bounded signed read URL / 预签名下载地址
    async fn presigned_url(&self, key: &str) -> StorageResult<String>;

    /// Canonical public URL, accessibility is not verified / 公共地址
    fn url(&self, key: &str) -> StorageResult<String>;

    /// Signed direct upload URL / 直传签名地址
    async fn upload_url(
        &self,
        key: &str,
        acl: Acl,
        mime_type: Option<&str>,
        cache_control: Option<&str>,
        expires: Option<&str>,
    ) -> StorageResult<UploadInfo>;

    /// Register the provider's browser uploader script / 注册前端上传脚本
    fn enqueue_uploader_scripts(&self);
}
