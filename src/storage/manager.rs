use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use anyhow::{anyhow, Result};

use super::{DriverContext, StorageDriver};

pub type DriverBox = Arc<Box<dyn StorageDriver>>;

/// Driver factory trait / 驱动工厂 trait
///
/// Holds the static, instance-free half of a provider: identification and
/// console deep links.
pub trait DriverFactory: Send + Sync {
    /// Driver identifier used in config / 驱动标识
    fn identifier(&self) -> &'static str;

    /// Display name / 显示名称
    fn name(&self) -> &'static str;

    /// Provider console link for a bucket / 控制台存储桶链接
    fn bucket_link(&self, bucket: &str) -> String;

    /// Provider console link for the folder holding `key` / 控制台路径链接
    fn path_link(&self, bucket: &str, key: &str) -> String;

    /// 创建驱动实例
    fn create_driver(&self, ctx: DriverContext) -> Result<Box<dyn StorageDriver>>;
}

/// Storage manager (provider registry) / 存储管理器
#[derive(Clone)]
pub struct StorageManager {
    factories: Arc<RwLock<HashMap<String, Arc<Box<dyn DriverFactory>>>>>,
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register driver factory / 注册驱动工厂
    pub async fn register_factory(&self, factory: Box<dyn DriverFactory>) -> Result<()> {
        let identifier = factory.identifier().to_string();
        let mut factories = self.factories.write().await;
        factories.insert(identifier.clone(), Arc::new(factory));

        tracing::info!("Driver factory registered: {}", identifier);
        Ok(())
    }

    /// Get factory by identifier / 获取驱动工厂
    pub async fn get_factory(&self, identifier: &str) -> Option<Arc<Box<dyn DriverFactory>>> {
        let factories = self.factories.read().await;
        factories.get(identifier).cloned()
    }

    /// Create the driver selected by `identifier` / 创建驱动实例
    pub async fn create_driver(&self, identifier: &str, ctx: DriverContext) -> Result<DriverBox> {
        let factory = self
            .get_factory(identifier)
            .await
            .ok_or_else(|| anyhow!("Driver type not found: {}", identifier))?;

        match factory.create_driver(ctx) {
            Ok(driver) => {
                tracing::info!("Driver created: {} ({})", identifier, factory.name());
                Ok(Arc::new(driver))
            }
            Err(e) => {
                tracing::error!("Driver creation failed: {} - {}", identifier, e);
                Err(e)
            }
        }
    }

    /// List registered drivers as (identifier, name) / 列出可用驱动
    pub async fn available_drivers(&self) -> Vec<(String, String)> {
        let factories = self.factories.read().await;
        let mut list: Vec<(String, String)> = factories
            .values()
            .map(|f| (f.identifier().to_string(), f.name().to_string()))
            .collect();
        list.sort();
        list
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}
