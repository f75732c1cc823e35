use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use mcloud_storage::notice::Notice;
use mcloud_storage::scripts::ScriptHandle;
use mcloud_storage::storage::{Acl, DriverStatus, FileInfo, UploadInfo};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use super::{bad_request, storage_error, ApiResponse, ApiResult};
use crate::state::AppState;

fn parse_acl(raw: Option<&str>) -> Result<Acl, super::ApiError> {
    match raw {
        None => Ok(Acl::PublicRead),
        Some(raw) => raw.parse::<Acl>().map_err(|e| bad_request(e.to_string())),
    }
}

fn require_key(key: &str) -> Result<(), super::ApiError> {
    if key.trim().is_empty() {
        return Err(bad_request("key is required"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

/// 存储状态
#[derive(Debug, Serialize)]
pub struct StorageStatus {
    pub driver: String,
    pub name: String,
    pub status: DriverStatus,
    pub bucket: String,
    pub region: Option<String>,
    pub bucket_link: Option<String>,
    pub supports_direct_uploads: bool,
    pub drivers: Vec<(String, String)>,
    pub version: String,
    pub build_time: String,
    pub started_at: String,
}

/// GET /api/storage/status
pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult<StorageStatus> {
    let driver = &state.driver;
    Ok(Json(ApiResponse::success(StorageStatus {
        driver: driver.identifier().to_string(),
        name: driver.name().to_string(),
        status: driver.status(),
        bucket: driver.bucket().to_string(),
        region: driver.region().map(String::from),
        bucket_link: state.bucket_link().await,
        supports_direct_uploads: driver.supports_direct_uploads(),
        drivers: state.storage_manager.available_drivers().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_time: env!("BUILD_TIME").to_string(),
        started_at: state.started_at.to_rfc3339(),
    })))
}

/// POST /api/storage/validate
pub async fn validate(State(state): State<Arc<AppState>>) -> ApiResult<DriverStatus> {
    let status = state.driver.validate_settings().await.map_err(storage_error)?;
    tracing::info!("Storage settings validated: {:?}", status);
    Ok(Json(ApiResponse::success(status)))
}

/// GET /api/storage/exists?key=
pub async fn exists(State(state): State<Arc<AppState>>, Query(q): Query<KeyQuery>) -> ApiResult<bool> {
    require_key(&q.key)?;
    let exists = state.driver.exists(&q.key).await.map_err(storage_error)?;
    Ok(Json(ApiResponse::success(exists)))
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    #[serde(flatten)]
    pub info: FileInfo,
    pub path_link: Option<String>,
}

/// GET /api/storage/info?key=
pub async fn info(State(state): State<Arc<AppState>>, Query(q): Query<KeyQuery>) -> ApiResult<InfoResponse> {
    require_key(&q.key)?;
    let info = state.driver.info(&q.key).await.map_err(storage_error)?;
    let path_link = state.path_link(&q.key).await;
    Ok(Json(ApiResponse::success(InfoResponse { info, path_link })))
}

/// GET /api/storage/url?key=
pub async fn url(State(state): State<Arc<AppState>>, Query(q): Query<KeyQuery>) -> ApiResult<String> {
    require_key(&q.key)?;
    let url = state.driver.url(&q.key).map_err(storage_error)?;
    Ok(Json(ApiResponse::success(url)))
}

/// GET /api/storage/presigned?key=
pub async fn presigned(State(state): State<Arc<AppState>>, Query(q): Query<KeyQuery>) -> ApiResult<String> {
    require_key(&q.key)?;
    let url = state.driver.presigned_url(&q.key).await.map_err(storage_error)?;
    Ok(Json(ApiResponse::success(url)))
}

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub key: String,
    pub acl: Option<String>,
    pub mime_type: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
}

/// POST /api/storage/upload-url - 浏览器直传签名
pub async fn upload_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadUrlRequest>,
) -> ApiResult<UploadInfo> {
    require_key(&req.key)?;
    if !state.driver.supports_direct_uploads() {
        return Err(bad_request("Direct uploads are not supported"));
    }
    let acl = parse_acl(req.acl.as_deref())?;
    let info = state
        .driver
        .upload_url(
            &req.key,
            acl,
            req.mime_type.as_deref(),
            req.cache_control.as_deref(),
            req.expires.as_deref(),
        )
        .await
        .map_err(storage_error)?;
    Ok(Json(ApiResponse::success(info)))
}

/// 上传临时文件，离开作用域时删除
struct TempUpload(PathBuf);

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            tracing::debug!("Failed to remove {}: {}", self.0.display(), e);
        }
    }
}

/// POST /api/storage/upload - 表单上传（字段 key, acl, cache_control, file）
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> ApiResult<String> {
    let mut key = None;
    let mut acl = None;
    let mut cache_control = None;
    let mut temp = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "key" => key = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?),
            "acl" => acl = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?),
            "cache_control" => {
                cache_control = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?)
            }
            "file" => {
                let path = std::env::temp_dir().join(format!("mcloud-upload-{:016x}", rand::random::<u64>()));
                let mut file = tokio::fs::File::create(&path)
                    .await
                    .map_err(|e| storage_error(e.into()))?;
                let guard = TempUpload(path);
                // 分块写入临时文件，不在内存里攒整个文件
                while let Some(chunk) = field.chunk().await.map_err(|e| bad_request(e.to_string()))? {
                    file.write_all(&chunk).await.map_err(|e| storage_error(e.into()))?;
                }
                file.flush().await.map_err(|e| storage_error(e.into()))?;
                temp = Some(guard);
            }
            _ => {}
        }
    }

    let key = key.ok_or_else(|| bad_request("key is required"))?;
    require_key(&key)?;
    let temp = temp.ok_or_else(|| bad_request("file is required"))?;
    let acl = parse_acl(acl.as_deref())?;

    let url = state
        .driver
        .upload(&key, &temp.0, acl, cache_control.as_deref().filter(|s| !s.is_empty()), None)
        .await
        .map_err(storage_error)?;
    Ok(Json(ApiResponse::success(url)))
}

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub source_key: String,
    pub dest_key: String,
    pub acl: Option<String>,
    pub mime_type: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
}

/// POST /api/storage/copy
pub async fn copy(State(state): State<Arc<AppState>>, Json(req): Json<CopyRequest>) -> ApiResult<()> {
    require_key(&req.source_key)?;
    require_key(&req.dest_key)?;
    let acl = parse_acl(req.acl.as_deref())?;
    state
        .driver
        .copy(
            &req.source_key,
            &req.dest_key,
            acl,
            req.mime_type.as_deref(),
            req.cache_control.as_deref(),
            req.expires.as_deref(),
        )
        .await
        .map_err(storage_error)?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// POST /api/storage/delete
pub async fn delete(State(state): State<Arc<AppState>>, Json(req): Json<DeleteRequest>) -> ApiResult<()> {
    require_key(&req.key)?;
    state.driver.delete(&req.key).await.map_err(storage_error)?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct AclRequest {
    pub key: String,
    pub acl: String,
}

/// POST /api/storage/acl
pub async fn insure_acl(State(state): State<Arc<AppState>>, Json(req): Json<AclRequest>) -> ApiResult<()> {
    require_key(&req.key)?;
    let acl = parse_acl(Some(&req.acl))?;
    state.driver.insure_acl(&req.key, acl).await.map_err(storage_error)?;
    Ok(Json(ApiResponse::success(())))
}

/// GET /api/notices - 取出待显示的通知
pub async fn notices(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Notice>> {
    // 触发配置检查，未就绪时会写入通知
    state.driver.enabled();
    Ok(Json(ApiResponse::success(state.notices.drain())))
}

/// GET /api/scripts
pub async fn scripts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ScriptHandle>> {
    Ok(Json(ApiResponse::success(state.scripts.scripts())))
}
