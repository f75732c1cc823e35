//! GCS 客户端（驱动持有的连接句柄）
//!
//! 基于 google-cloud-storage。存储客户端在第一次调用时建立并换取访问令牌，
//! 之后由 SDK 复用令牌；签名 URL 只在本地计算。不做重试。

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::buckets::get::GetBucketRequest;
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::patch::PatchObjectRequest;
use google_cloud_storage::http::objects::rewrite::RewriteObjectRequest;
use google_cloud_storage::http::objects::upload::{UploadObjectRequest, UploadType};
use google_cloud_storage::http::objects::Object;
use google_cloud_storage::http::Error as GcsError;
use google_cloud_storage::sign::{RsaKeyPair, SignBy, SignedURLMethod, SignedURLOptions};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tokio::sync::OnceCell;
use tokio_util::io::ReaderStream;

use super::config::GoogleConfig;
use super::credentials::Credentials;
use super::links::{encode_key, expires_in, DownloadEndpoint};

/// GCS 客户端
pub struct GoogleClient {
    credentials: CredentialsFile,
    storage_endpoint: String,
    download: DownloadEndpoint,
    storage: OnceCell<Client>,
    signer: Client,
    http: reqwest::Client,
}

/// predefinedAcl 名称转 SDK 枚举（两种枚举都按 camelCase 序列化）
fn predefined<T: DeserializeOwned>(name: &str) -> Result<T> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| anyhow!("Unknown predefined ACL: {}", name))
}

fn is_not_found(err: &GcsError) -> bool {
    match err {
        GcsError::Response(e) => e.code == 404,
        GcsError::HttpClient(e) => e.status().map(|s| s.as_u16()) == Some(404),
        _ => false,
    }
}

fn get_request(bucket: &str, key: &str) -> GetObjectRequest {
    GetObjectRequest {
        bucket: bucket.to_string(),
        object: key.to_string(),
        ..Default::default()
    }
}

/// 保留服务端消息和状态码
fn api_error(err: GcsError) -> anyhow::Error {
    match err {
        GcsError::Response(e) => anyhow!("Google Storage error ({}): {}", e.code, e.message),
        other => anyhow!("Google Storage request failed: {}", other),
    }
}

impl GoogleClient {
    /// 从服务账号凭证创建（不访问网络）
    pub fn from_credentials(credentials: &Credentials, config: &GoogleConfig) -> Result<Self> {
        let mut file = credentials.to_file()?;
        if let Some(token_uri) = &config.token_uri {
            file.token_uri = Some(token_uri.clone());
        }

        let private_key = file.private_key.clone().unwrap_or_default().into_bytes();
        RsaKeyPair::try_from(&private_key).map_err(|e| anyhow!("Invalid private key: {}", e))?;
        let download = DownloadEndpoint::parse(&config.download_url)?;

        let signer = Client::new(ClientConfig {
            default_google_access_id: file.client_email.clone(),
            default_sign_by: Some(SignBy::PrivateKey(private_key)),
            ..ClientConfig::default().anonymous()
        });

        Ok(Self {
            credentials: file,
            storage_endpoint: config.storage_endpoint.clone(),
            download,
            storage: OnceCell::new(),
            signer,
            http: reqwest::Client::new(),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// 认证后的存储客户端，只建立一次
    async fn storage(&self) -> Result<&Client> {
        self.storage
            .get_or_try_init(|| async {
                let config = ClientConfig {
                    storage_endpoint: self.storage_endpoint.clone(),
                    ..ClientConfig::default()
                }
                .with_credentials(self.credentials.clone())
                .await
                .map_err(|e| anyhow!("Google authentication failed: {}", e))?;
                tracing::debug!(
                    "Google access token issued for {}",
                    self.credentials.client_email.as_deref().unwrap_or_default()
                );
                Ok::<_, anyhow::Error>(Client::new(config))
            })
            .await
    }

    /// 存储桶是否存在
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let request = GetBucketRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };
        match self.storage().await?.get_bucket(&request).await {
            Ok(found) => {
                tracing::debug!("Bucket {} found in {}", found.name, found.location);
                Ok(true)
            }
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(api_error(e)),
        }
    }

    /// 对象是否存在
    pub async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.storage().await?.get_object(&get_request(bucket, key)).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(api_error(e)),
        }
    }

    /// 获取对象元数据
    pub async fn object_metadata(&self, bucket: &str, key: &str) -> Result<Object> {
        self.storage()
            .await?
            .get_object(&get_request(bucket, key))
            .await
            .map_err(api_error)
    }

    /// 服务端复制（rewrite，同时设置目标 ACL 和元数据）
    pub async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
        predefined_acl: &str,
        content_type: Option<&str>,
        cache_control: Option<&str>,
    ) -> Result<Object> {
        let metadata = (content_type.is_some() || cache_control.is_some()).then(|| Object {
            content_type: content_type.map(String::from),
            cache_control: cache_control.map(String::from),
            ..Default::default()
        });
        let mut request = RewriteObjectRequest {
            source_bucket: bucket.to_string(),
            source_object: source_key.to_string(),
            destination_bucket: bucket.to_string(),
            destination_object: dest_key.to_string(),
            destination_predefined_object_acl: Some(predefined(predefined_acl)?),
            destination_metadata: metadata,
            ..Default::default()
        };

        let storage = self.storage().await?;
        loop {
            let response = storage.rewrite_object(&request).await.map_err(api_error)?;
            if response.done {
                return response
                    .resource
                    .ok_or_else(|| anyhow!("Copy to {} returned no object", dest_key));
            }
            match response.rewrite_token {
                Some(token) => request.rewrite_token = Some(token),
                None => return Err(anyhow!("Copy to {} stopped without a rewrite token", dest_key)),
            }
        }
    }

    /// 流式上传本地文件，元数据和数据在同一个请求里
    pub async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        file_name: &Path,
        content_type: &str,
        predefined_acl: &str,
        cache_control: Option<&str>,
    ) -> Result<Object> {
        let file = tokio::fs::File::open(file_name)
            .await
            .with_context(|| format!("Failed to open {}", file_name.display()))?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let request = UploadObjectRequest {
            bucket: bucket.to_string(),
            predefined_acl: Some(predefined(predefined_acl)?),
            ..Default::default()
        };
        let metadata = Object {
            name: key.to_string(),
            content_type: Some(content_type.to_string()),
            cache_control: cache_control.map(String::from),
            ..Default::default()
        };

        self.storage()
            .await?
            .upload_object(&request, body, &UploadType::Multipart(Box::new(metadata)))
            .await
            .map_err(api_error)
    }

    /// 重设对象 ACL
    pub async fn patch_acl(&self, bucket: &str, key: &str, predefined_acl: &str) -> Result<Object> {
        let request = PatchObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            predefined_acl: Some(predefined(predefined_acl)?),
            ..Default::default()
        };
        self.storage()
            .await?
            .patch_object(&request)
            .await
            .map_err(api_error)
    }

    /// 删除对象
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let request = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };
        self.storage()
            .await?
            .delete_object(&request)
            .await
            .map_err(api_error)
    }

    /// V4 签名 URL；headers 为 "name:value"
    pub async fn signed_url(
        &self,
        method: SignedURLMethod,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        headers: Vec<String>,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        let options = SignedURLOptions {
            method,
            start_time: Some(now.into()),
            expires: expires_in(now, expires_at),
            content_type: content_type.map(String::from),
            headers,
            style: self.download.style(),
            insecure: self.download.insecure(),
            ..Default::default()
        };
        self.signer
            .signed_url(bucket, &encode_key(key), None, None, options)
            .await
            .map_err(|e| anyhow!("Could not sign URL for {}: {}", key, e))
    }

    /// 公开地址，路径编码与签名地址一致
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        self.download.object_url(bucket, key)
    }
}
