//! Uploaded model storage

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use axum::body::Bytes;
use dashmap::DashMap;

use crate::error::IntegrationError;

/// One uploaded file on its way into the store
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub file_id: String,
    pub file_name: String,
    pub customer_id: String,
    pub content_type: &'static str,
    /// SHA256 of `bytes`, hex encoded
    pub checksum: String,
    pub bytes: Bytes,
}

impl BlobObject {
    /// `{customer_id}/{file_id}/{file_name}`
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.customer_id, self.file_id, self.file_name)
    }

    /// Request body sharing the upload's buffer
    pub fn body(&self) -> ByteStream {
        ByteStream::from(self.bytes.clone())
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Store the object and return its URL
    async fn put(&self, object: &BlobObject) -> Result<String, IntegrationError>;

    /// Bytes of a previously stored file, `None` when unknown
    async fn get(&self, file_id: &str) -> Result<Option<Bytes>, IntegrationError>;
}

/// In-process store
///
/// Serves as the unconfigured blob store and as the fallback when a
/// configured store rejects an upload.
#[derive(Debug, Default)]
pub struct LocalBlobStore {
    files: DashMap<String, Bytes>,
}

impl LocalBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_for(file_id: &str) -> String {
        format!("local://cache/{file_id}")
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn is_configured(&self) -> bool {
        false
    }

    async fn put(&self, object: &BlobObject) -> Result<String, IntegrationError> {
        self.files.insert(object.file_id.clone(), object.bytes.clone());
        Ok(Self::url_for(&object.file_id))
    }

    async fn get(&self, file_id: &str) -> Result<Option<Bytes>, IntegrationError> {
        Ok(self.files.get(file_id).map(|entry| entry.value().clone()))
    }
}

/// S3 bucket store
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    /// file_id -> object key for files stored by this process
    keys: DashMap<String, String>,
}

impl S3BlobStore {
    pub async fn new(bucket: String, public_base_url: Option<String>) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let public_base_url = public_base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"));
        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
            bucket,
            public_base_url,
            keys: DashMap::new(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn is_configured(&self) -> bool {
        true
    }

    async fn put(&self, object: &BlobObject) -> Result<String, IntegrationError> {
        let key = object.key();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(object.body())
            .content_type(object.content_type)
            .metadata("original-name", &object.file_name)
            .metadata("customer-id", &object.customer_id)
            .metadata("file-id", &object.file_id)
            .metadata("sha256", &object.checksum)
            .send()
            .await
            .map_err(|e| {
                IntegrationError::Storage(
                    aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        let url = format!("{}/{}", self.public_base_url, key);
        self.keys.insert(object.file_id.clone(), key);
        Ok(url)
    }

    async fn get(&self, file_id: &str) -> Result<Option<Bytes>, IntegrationError> {
        let Some(key) = self.keys.get(file_id).map(|k| k.value().clone()) else {
            return Ok(None);
        };
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                IntegrationError::Storage(
                    aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
                )
            })?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| IntegrationError::Storage(e.to_string()))?;
        Ok(Some(data.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(file_id: &str) -> BlobObject {
        BlobObject {
            file_id: file_id.into(),
            file_name: "part.stl".into(),
            customer_id: "anonymous-1".into(),
            content_type: "model/stl",
            checksum: String::new(),
            bytes: Bytes::from_static(b"solid part"),
        }
    }

    #[test]
    fn test_object_key_layout() {
        assert_eq!(object("f1").key(), "anonymous-1/f1/part.stl");
    }

    #[test]
    fn test_s3_body_shares_upload_buffer() {
        let object = object("f1");
        let body = object.body();
        let sent = body.bytes().unwrap();
        assert_eq!(sent, b"solid part");
        assert_eq!(sent.as_ptr(), object.bytes.as_ptr());
    }

    #[tokio::test]
    async fn test_local_store_round_trip() {
        let store = LocalBlobStore::new();
        let url = store.put(&object("f1")).await.unwrap();
        assert_eq!(url, "local://cache/f1");
        assert_eq!(
            store.get("f1").await.unwrap().as_deref(),
            Some(&b"solid part"[..])
        );
        assert!(store.get("missing").await.unwrap().is_none());
    }
}
