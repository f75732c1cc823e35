use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

/// Browser uploader scripts (compile-time embed from assets/) / 嵌入前端上传脚本
#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "js/*.js"]
struct UploaderAssets;

/// GET /assets/*path - 嵌入的静态文件
pub async fn serve_asset(Path(path): Path<String>) -> Response {
    match UploaderAssets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
                ],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}
