//! Browser script registration / 前端脚本注册

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A script the host page must load / 需要加载的脚本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptHandle {
    pub handle: String,
    pub src: String,
    pub in_footer: bool,
}

pub trait ScriptRegistry: Send + Sync {
    fn enqueue_script(&self, script: ScriptHandle);
}

/// Keeps registrations in order, one per handle / 脚本队列
#[derive(Default)]
pub struct ScriptQueue {
    scripts: RwLock<Vec<ScriptHandle>>,
}

impl ScriptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> Vec<ScriptHandle> {
        self.scripts.read().clone()
    }
}

impl ScriptRegistry for ScriptQueue {
    fn enqueue_script(&self, script: ScriptHandle) {
        let mut scripts = self.scripts.write();
        match scripts.iter_mut().find(|s| s.handle == script.handle) {
            Some(existing) => *existing = script,
            None => {
                tracing::debug!("Script enqueued: {} -> {}", script.handle, script.src);
                scripts.push(script);
            }
        }
    }
}
