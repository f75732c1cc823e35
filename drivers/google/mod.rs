//! Google Cloud Storage 驱动
//!
//! 基于 google-cloud-storage 访问 GCS（服务账号授权），
//! 支持 V4 签名 URL 和浏览器直传。

pub mod client;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod links;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GoogleClient;
pub use config::GoogleConfig;
pub use credentials::Credentials;
pub use driver::{GoogleStorage, GoogleStorageFactory, GOOGLE_ACL, GOOGLE_CANNED_ACL};
