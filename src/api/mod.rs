pub mod assets;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mcloud_storage::storage::StorageError;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn bad_request(message: impl Into<String>) -> ApiError {
    let message = message.into();
    (StatusCode::BAD_REQUEST, Json(json!({"code": 400, "message": message})))
}

/// Map driver errors onto HTTP statuses / 驱动错误转HTTP状态
pub fn storage_error(err: StorageError) -> ApiError {
    let status = match err {
        StorageError::InvalidStorageSettings => StatusCode::SERVICE_UNAVAILABLE,
        StorageError::UnsupportedAcl(_) => StatusCode::BAD_REQUEST,
        StorageError::Backend(_) => StatusCode::BAD_GATEWAY,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({"code": status.as_u16(), "message": err.to_string()})),
    )
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/storage/status", get(storage::status))
        .route("/api/storage/validate", post(storage::validate))
        .route("/api/storage/exists", get(storage::exists))
        .route("/api/storage/info", get(storage::info))
        .route("/api/storage/url", get(storage::url))
        .route("/api/storage/presigned", get(storage::presigned))
        .route("/api/storage/upload-url", post(storage::upload_url))
        .route(
            "/api/storage/upload",
            post(storage::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/storage/copy", post(storage::copy))
        .route("/api/storage/delete", post(storage::delete))
        .route("/api/storage/acl", post(storage::insure_acl))
        .route("/api/notices", get(storage::notices))
        .route("/api/scripts", get(storage::scripts))
        .route("/assets/*path", get(assets::serve_asset))
        .with_state(state)
}
