//! User-facing notices / 用户通知

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Notification surface / 通知输出
pub trait NoticeSink: Send + Sync {
    fn display_admin_notice(&self, level: NoticeLevel, message: &str);
}

/// Log-only sink / 仅记录日志
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn display_admin_notice(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!("{}", message),
            NoticeLevel::Warning => tracing::warn!("{}", message),
            NoticeLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// Collects deduplicated notices until the host drains them / 通知收集器
#[derive(Default)]
pub struct NoticeBoard {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }
}

impl NoticeSink for NoticeBoard {
    fn display_admin_notice(&self, level: NoticeLevel, message: &str) {
        let notice = Notice {
            level,
            message: message.to_string(),
        };
        let mut notices = self.notices.lock();
        if !notices.contains(&notice) {
            TracingNotices.display_admin_notice(level, message);
            notices.push(notice);
        }
    }
}
