use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use mcloud_storage::config;
use mcloud_storage::notice::NoticeBoard;
use mcloud_storage::scripts::ScriptQueue;
use mcloud_storage::settings::JsonFileSettings;
use mcloud_storage::storage::{DriverContext, StorageManager};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcloud_storage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("mcloud-storage {} (built {})", env!("CARGO_PKG_VERSION"), env!("BUILD_TIME"));

    // Load configuration / 加载配置
    let app_config = config::load_config()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    tracing::info!("Server will listen on {}", app_config.get_bind_address());

    // Persisted driver settings / 驱动设置
    let settings_path = app_config.get_settings_path();
    let settings = Arc::new(JsonFileSettings::open(&settings_path)?);
    tracing::info!("Settings loaded from {}", settings.path().display());

    let notices = Arc::new(NoticeBoard::new());
    let scripts = Arc::new(ScriptQueue::new());

    let storage_manager = StorageManager::new();
    // Register all storage driver factories / 注册所有存储驱动工厂
    mcloud_storage::register_storage_drivers(&storage_manager).await?;

    let driver_type = app_config.storage.driver.clone();
    let driver = storage_manager
        .create_driver(
            &driver_type,
            DriverContext {
                settings,
                notices: notices.clone(),
                scripts: scripts.clone(),
                config: app_config.clone(),
            },
        )
        .await?;
    tracing::info!("Storage driver: {} ({:?})", driver.name(), driver.status());
    driver.enqueue_uploader_scripts();

    let state = Arc::new(AppState {
        storage_manager,
        driver,
        driver_type,
        notices,
        scripts,
        started_at: Utc::now(),
    });

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
