//! 对象地址：公开地址和签名地址共用同一套路径编码

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_cloud_storage::sign::URLStyle;
use url::Url;

/// V4 签名的最长有效期（7天）
const MAX_EXPIRES_SECS: i64 = 604_800;

/// 下一个 UTC 自然日的零点
pub fn next_day_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    tomorrow
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now + Duration::days(1))
}

/// 签名有效秒数，限制在 1 秒到 7 天之间
pub fn expires_in(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> std::time::Duration {
    let secs = (expires_at - now).num_seconds().clamp(1, MAX_EXPIRES_SECS);
    std::time::Duration::from_secs(secs as u64)
}

/// 对象路径编码，保留 '/'
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// 下载端点（签名 URL 的 host 和路径前缀）
#[derive(Debug, Clone)]
pub struct DownloadEndpoint {
    base: String,
    host: String,
    prefix: String,
    insecure: bool,
}

impl DownloadEndpoint {
    pub fn parse(download_url: &str) -> Result<Self> {
        let url = Url::parse(download_url)
            .with_context(|| format!("Invalid download URL: {}", download_url))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("Download URL has no host: {}", download_url))?;
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self {
            base: download_url.trim_end_matches('/').to_string(),
            host,
            prefix: url.path().trim_matches('/').to_string(),
            insecure: url.scheme() == "http",
        })
    }

    /// 公开地址：gs://bucket/key 换成下载前缀
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base, bucket, encode_key(key))
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn style(&self) -> Box<dyn URLStyle + Send + Sync> {
        Box::new(self.clone())
    }
}

impl URLStyle for DownloadEndpoint {
    fn host(&self, _bucket: &str) -> String {
        self.host.clone()
    }

    // object 已经过 encode_key
    fn path(&self, bucket: &str, object: &str) -> String {
        let path = if object.is_empty() {
            bucket.to_string()
        } else {
            format!("{}/{}", bucket, object)
        };
        if self.prefix.is_empty() {
            path
        } else {
            format!("{}/{}", self.prefix, path)
        }
    }
}
