use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::StorageError;

/// Abstract access control / 抽象访问控制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Acl {
    /// Readable by authenticated principals only / 私有读
    PrivateRead,
    /// Readable by anyone / 公共读
    PublicRead,
}

impl Acl {
    pub const ALL: [Acl; 2] = [Acl::PrivateRead, Acl::PublicRead];

    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::PrivateRead => "private-read",
            Acl::PublicRead => "public-read",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Acl {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" | "private-read" | "authenticated-read" => Ok(Acl::PrivateRead),
            "public" | "public-read" => Ok(Acl::PublicRead),
            other => Err(StorageError::UnsupportedAcl(other.to_string())),
        }
    }
}

/// ACL -> provider token table / ACL到服务商令牌的映射表
///
/// Every driver declares its own table; a missing entry is a programming error
/// and surfaces as `UnsupportedAcl`.
#[derive(Debug, Clone, Copy)]
pub struct AclMap(pub &'static [(Acl, &'static str)]);

impl AclMap {
    pub fn map(&self, acl: Acl) -> Result<&'static str, StorageError> {
        self.0
            .iter()
            .find(|(a, _)| *a == acl)
            .map(|(_, token)| *token)
            .ok_or_else(|| StorageError::UnsupportedAcl(acl.to_string()))
    }

    /// Map a raw ACL string (from config or a request body)
    pub fn map_str(&self, raw: &str) -> Result<&'static str, StorageError> {
        self.map(raw.parse()?)
    }

    pub fn covers_all(&self) -> bool {
        Acl::ALL.iter().all(|acl| self.map(*acl).is_ok())
    }
}
