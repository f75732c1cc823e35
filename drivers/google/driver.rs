//! Google Cloud Storage 驱动

use async_trait::async_trait;
use chrono::Utc;
use google_cloud_storage::sign::SignedURLMethod;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::notice::{NoticeLevel, NoticeSink};
use crate::probe;
use crate::scripts::{ScriptHandle, ScriptRegistry};
use crate::settings::SettingsStore;
use crate::storage::{
    Acl, AclMap, DriverContext, DriverFactory, DriverStatus, FileInfo, StorageDriver, StorageError,
    StorageResult, UploadInfo,
};

use super::client::GoogleClient;
use super::config::GoogleConfig;
use super::credentials::{self, Credentials};
use super::links::next_day_expiry;

pub const IDENTIFIER: &str = "google";
pub const NAME: &str = "Google Cloud Storage";

/// 验证失败标记（持久化）
pub const SETTINGS_ERROR_OPTION: &str = "mcloud-google-settings-error";
pub const UPLOADER_SCRIPT: &str = "mcloud-media-upload-google";

const MISSING_CREDENTIALS_NOTICE: &str =
    "To start using Cloud Storage, you will need to supply your Google credentials.";
const INVALID_SETTINGS_NOTICE: &str =
    "Your Google Storage settings are incorrect or the bucket does not exist.  Please verify your settings and update them.";

/// JSON API predefinedAcl
pub const GOOGLE_ACL: AclMap = AclMap(&[
    (Acl::PrivateRead, "authenticatedRead"),
    (Acl::PublicRead, "publicRead"),
]);

/// 签名上传使用的 x-goog-acl 头
pub const GOOGLE_CANNED_ACL: AclMap = AclMap(&[
    (Acl::PrivateRead, "authenticated-read"),
    (Acl::PublicRead, "public-read"),
]);

/// GCS 驱动
pub struct GoogleStorage {
    bucket: String,
    credentials: Option<Credentials>,
    google: GoogleConfig,
    public_js_url: String,
    settings: Arc<dyn SettingsStore>,
    notices: Arc<dyn NoticeSink>,
    scripts: Arc<dyn ScriptRegistry>,
    settings_error: AtomicBool,
    validated: AtomicBool,
    client: RwLock<Option<Arc<GoogleClient>>>,
}

impl GoogleStorage {
    pub fn new(ctx: DriverContext) -> Self {
        let bucket = credentials::resolve_bucket(ctx.settings.as_ref()).unwrap_or_default();
        let creds = credentials::resolve_credentials(ctx.settings.as_ref());
        let settings_error = ctx.settings.get_bool(SETTINGS_ERROR_OPTION);

        let driver = Self {
            bucket,
            credentials: creds,
            google: ctx.config.google.clone(),
            public_js_url: ctx.config.storage.public_js_url.clone(),
            settings: ctx.settings,
            notices: ctx.notices,
            scripts: ctx.scripts,
            settings_error: AtomicBool::new(settings_error),
            validated: AtomicBool::new(false),
            client: RwLock::new(None),
        };

        let client = driver.get_client();
        *driver.client.write() = client;
        driver
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some() && !self.bucket.is_empty()
    }

    /// 构造客户端，失败只记录日志
    pub fn get_client(&self) -> Option<Arc<GoogleClient>> {
        if !self.enabled() {
            return None;
        }
        let credentials = self.credentials.as_ref()?;
        match GoogleClient::from_credentials(credentials, &self.google) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::info!("Could not create Google storage client: {}", e);
                None
            }
        }
    }

    fn current_client(&self) -> StorageResult<Arc<GoogleClient>> {
        self.client
            .read()
            .clone()
            .ok_or(StorageError::InvalidStorageSettings)
    }

    fn mark_invalid(&self) {
        self.settings_error.store(true, Ordering::SeqCst);
        self.validated.store(false, Ordering::SeqCst);
        *self.client.write() = None;
        if let Err(e) = self.settings.update_option(SETTINGS_ERROR_OPTION, Value::Bool(true)) {
            tracing::error!("Failed to persist {}: {}", SETTINGS_ERROR_OPTION, e);
        }
    }

    async fn signed_get(&self, client: &GoogleClient, key: &str) -> StorageResult<String> {
        let now = Utc::now();
        client
            .signed_url(SignedURLMethod::GET, &self.bucket, key, None, vec![], now, next_day_expiry(now))
            .await
            .map_err(StorageError::from_other)
    }
}

#[async_trait]
impl StorageDriver for GoogleStorage {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn supports_direct_uploads(&self) -> bool {
        true
    }

    async fn validate_settings(&self) -> StorageResult<DriverStatus> {
        if let Err(e) = self.settings.delete_option(SETTINGS_ERROR_OPTION) {
            tracing::warn!("Failed to clear {}: {}", SETTINGS_ERROR_OPTION, e);
        }
        self.settings_error.store(false, Ordering::SeqCst);
        self.validated.store(false, Ordering::SeqCst);
        *self.client.write() = None;

        if !self.enabled() {
            return Ok(DriverStatus::Unconfigured);
        }

        let Some(client) = self.get_client() else {
            self.mark_invalid();
            return Ok(DriverStatus::Invalid);
        };

        match client.bucket_exists(&self.bucket).await {
            Ok(true) => {
                *self.client.write() = Some(client);
                self.validated.store(true, Ordering::SeqCst);
                tracing::info!("Google Storage settings validated, bucket: {}", self.bucket);
                Ok(DriverStatus::Valid)
            }
            Ok(false) => {
                tracing::info!("Bucket does not exist: {}", self.bucket);
                self.mark_invalid();
                Ok(DriverStatus::Invalid)
            }
            Err(e) => {
                tracing::error!("Google Storage validation failed: {}", e);
                self.mark_invalid();
                Err(StorageError::from_other(e))
            }
        }
    }

    fn enabled(&self) -> bool {
        if !self.is_configured() {
            self.notices
                .display_admin_notice(NoticeLevel::Error, MISSING_CREDENTIALS_NOTICE);
            return false;
        }
        if self.settings_error.load(Ordering::SeqCst) {
            self.notices
                .display_admin_notice(NoticeLevel::Error, INVALID_SETTINGS_NOTICE);
            return false;
        }
        true
    }

    fn status(&self) -> DriverStatus {
        if !self.is_configured() {
            DriverStatus::Unconfigured
        } else if self.settings_error.load(Ordering::SeqCst) {
            DriverStatus::Invalid
        } else if self.validated.load(Ordering::SeqCst) {
            DriverStatus::Valid
        } else {
            DriverStatus::Unvalidated
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn insure_acl(&self, key: &str, acl: Acl) -> StorageResult<()> {
        let client = self.current_client()?;
        let predefined = GOOGLE_ACL.map(acl)?;
        client
            .patch_acl(&self.bucket, key, predefined)
            .await
            .map_err(StorageError::from_other)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let client = self.current_client()?;
        client
            .object_exists(&self.bucket, key)
            .await
            .map_err(StorageError::from_other)
    }

    async fn copy(
        &self,
        source_key: &str,
        dest_key: &str,
        acl: Acl,
        mime_type: Option<&str>,
        cache_control: Option<&str>,
        _expires: Option<&str>,
    ) -> StorageResult<()> {
        let client = self.current_client()?;
        let predefined = GOOGLE_ACL.map(acl)?;
        // GCS 没有 Expires 元数据
        client
            .copy_object(
                &self.bucket,
                source_key,
                dest_key,
                predefined,
                mime_type.filter(|s| !s.is_empty()),
                cache_control.filter(|s| !s.is_empty()),
            )
            .await
            .map_err(|e| {
                tracing::error!("Error copying {} to {}: {}", source_key, dest_key, e);
                StorageError::from_other(e)
            })?;
        Ok(())
    }

    async fn upload(
        &self,
        key: &str,
        file_name: &Path,
        acl: Acl,
        cache_control: Option<&str>,
        _expires: Option<&str>,
    ) -> StorageResult<String> {
        let client = self.current_client()?;
        let predefined = GOOGLE_ACL.map(acl)?;
        let content_type = mime_guess::from_path(key).first_or_octet_stream().to_string();

        let started = Instant::now();
        tracing::info!(file = key, "Start upload");

        let result = client
            .upload_file(
                &self.bucket,
                key,
                file_name,
                &content_type,
                predefined,
                cache_control.filter(|s| !s.is_empty()),
            )
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(_) => {
                tracing::info!(file = key, elapsed_ms, "End upload");
                Ok(client.public_url(&self.bucket, key))
            }
            Err(e) => {
                tracing::error!(file = key, elapsed_ms, "Error uploading {}: {}", file_name.display(), e);
                Err(StorageError::from_other(e))
            }
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let client = self.current_client()?;
        client
            .delete_object(&self.bucket, key)
            .await
            .map_err(|e| {
                tracing::error!("Error deleting {}: {}", key, e);
                StorageError::from_other(e)
            })
    }

    async fn info(&self, key: &str) -> StorageResult<FileInfo> {
        let client = self.current_client()?;
        let metadata = client
            .object_metadata(&self.bucket, key)
            .await
            .map_err(StorageError::from_other)?;

        let mime_type = metadata.content_type.clone().unwrap_or_default();
        let url = self.signed_get(&client, key).await?;

        let dimensions = if mime_type.starts_with("image/") {
            match probe::probe_image_size(client.http(), &url).await {
                Ok(size) => size,
                Err(e) => {
                    tracing::warn!("Could not read image size of {}: {}", key, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(FileInfo {
            key: key.to_string(),
            url,
            size: u64::try_from(metadata.size).unwrap_or(0),
            mime_type,
            dimensions,
        })
    }

    async fn presigned_url(&self, key: &str) -> StorageResult<String> {
        let client = self.current_client()?;
        self.signed_get(&client, key).await
    }

    fn url(&self, key: &str) -> StorageResult<String> {
        let client = self.current_client()?;
        Ok(client.public_url(&self.bucket, key))
    }

    async fn upload_url(
        &self,
        key: &str,
        acl: Acl,
        mime_type: Option<&str>,
        cache_control: Option<&str>,
        _expires: Option<&str>,
    ) -> StorageResult<UploadInfo> {
        let client = self.current_client()?;
        let predefined = GOOGLE_ACL.map(acl)?;
        let canned = GOOGLE_CANNED_ACL.map(acl)?;

        let mime_type = mime_type.filter(|s| !s.is_empty());
        let cache_control = cache_control.filter(|s| !s.is_empty());

        // 浏览器需要原样带上这些头
        let mut headers = BTreeMap::new();
        let mut signed_headers = Vec::new();
        if let Some(mime) = mime_type {
            headers.insert("Content-Type".to_string(), mime.to_string());
        }
        if let Some(cc) = cache_control {
            headers.insert("Cache-Control".to_string(), cc.to_string());
            signed_headers.push(format!("cache-control:{}", cc));
        }
        headers.insert("x-goog-acl".to_string(), canned.to_string());
        signed_headers.push(format!("x-goog-acl:{}", canned));

        let now = Utc::now();
        let expires_at = next_day_expiry(now);
        let url = client
            .signed_url(
                SignedURLMethod::PUT,
                &self.bucket,
                key,
                mime_type,
                signed_headers,
                now,
                expires_at,
            )
            .await
            .map_err(StorageError::from_other)?;

        Ok(UploadInfo {
            key: key.to_string(),
            url,
            acl: predefined.to_string(),
            method: "PUT".to_string(),
            headers,
            expires_at,
        })
    }

    fn enqueue_uploader_scripts(&self) {
        self.scripts.enqueue_script(ScriptHandle {
            handle: UPLOADER_SCRIPT.to_string(),
            src: format!("{}/{}.js", self.public_js_url.trim_end_matches('/'), UPLOADER_SCRIPT),
            in_footer: true,
        });
    }
}

/// GCS 驱动工厂
pub struct GoogleStorageFactory;

impl DriverFactory for GoogleStorageFactory {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn bucket_link(&self, bucket: &str) -> String {
        format!("https://console.cloud.google.com/storage/browser/{}", bucket)
    }

    fn path_link(&self, bucket: &str, key: &str) -> String {
        // 去掉文件名，只保留目录
        let dir = key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        if dir.is_empty() {
            format!("{}/", self.bucket_link(bucket))
        } else {
            format!("{}/{}/", self.bucket_link(bucket), dir)
        }
    }

    fn create_driver(&self, ctx: DriverContext) -> anyhow::Result<Box<dyn StorageDriver>> {
        Ok(Box::new(GoogleStorage::new(ctx)))
    }
}
