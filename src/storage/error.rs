use thiserror::Error;

/// Storage operation error / 存储操作错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// Client handle is absent, raised before any network call / 存储设置无效
    #[error("Storage settings are invalid")]
    InvalidStorageSettings,

    /// Any backend, network or service failure, keeps the original message / 后端错误
    #[error("{0}")]
    Backend(String),

    /// ACL value with no provider mapping / 不支持的ACL
    #[error("Unsupported ACL: {0}")]
    UnsupportedAcl(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap any error as a backend error, preserving its message
    pub fn from_other(err: impl std::fmt::Display) -> Self {
        StorageError::Backend(err.to_string())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
