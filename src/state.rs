use chrono::{DateTime, Utc};
use mcloud_storage::notice::NoticeBoard;
use mcloud_storage::scripts::ScriptQueue;
use mcloud_storage::storage::{DriverBox, StorageManager};
use std::sync::Arc;

pub struct AppState {
    pub storage_manager: StorageManager,
    /// Active driver, selected by `storage.driver` / 当前驱动
    pub driver: DriverBox,
    pub driver_type: String,
    pub notices: Arc<NoticeBoard>,
    pub scripts: Arc<ScriptQueue>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Console link for the configured bucket / 控制台存储桶链接
    pub async fn bucket_link(&self) -> Option<String> {
        let factory = self.storage_manager.get_factory(&self.driver_type).await?;
        Some(factory.bucket_link(self.driver.bucket()))
    }

    /// Console link for the folder holding `key` / 控制台路径链接
    pub async fn path_link(&self, key: &str) -> Option<String> {
        let factory = self.storage_manager.get_factory(&self.driver_type).await?;
        Some(factory.path_link(self.driver.bucket(), key))
    }
}
