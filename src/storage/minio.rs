use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::MinioConfig;
use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 8 * 1024 * 1024; // 8MB parts

/// Blob storage for listing images, page artwork and the tour video.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key` and returns its public URL.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String>;

    async fn delete(&self, key: &str) -> Result<()>;

    fn public_url(&self, key: &str) -> String;

    /// Maps a public URL back to its key, or `None` for URLs this store does not own.
    fn key_from_url(&self, url: &str) -> Option<String>;
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

fn strip_base(base: &str, url: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    url.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

pub struct MinioStore {
    pub client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl MinioStore {
    pub async fn new(config: &MinioConfig) -> Result<Self> {
        debug!(
            endpoint = %config.endpoint,
            bucket = %config.bucket,
            region = %config.region,
            "Initializing MinIO store"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static-credentials",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        let client = S3Client::from_conf(s3_config);

        debug!("Verifying bucket access");
        if let Err(e) = client.head_bucket().bucket(&config.bucket).send().await {
            error!(
                error = ?e,
                bucket = %config.bucket,
                "Failed to access bucket"
            );
            return Err(Error::Storage(format!(
                "Cannot access bucket '{}': {}",
                config.bucket, e
            )));
        }

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.clone(),
        })
    }

    async fn upload_single_part(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let error_msg = match &e {
                    SdkError::ServiceError(service_error) => {
                        error!(
                            error = ?service_error.err(),
                            raw_response = ?service_error.raw(),
                            "MinIO service error"
                        );
                        format!("MinIO service error: {}", service_error.err())
                    }
                    _ => {
                        error!(error = ?e, "MinIO upload error");
                        format!("MinIO error: {}", e)
                    }
                };
                Err(Error::Storage(error_msg))
            }
        }
    }

    async fn upload_multipart(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        info!(
            size_mb = body.len() / 1024 / 1024,
            key = key,
            "Large object, using multipart upload"
        );

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| Error::Storage("Failed to get upload ID".to_string()))?
            .to_string();

        let uploaded = self.upload_parts(key, &upload_id, &body).await;
        abort_on_failure(uploaded, || self.abort_multipart(key, &upload_id)).await
    }

    async fn upload_parts(&self, key: &str, upload_id: &str, body: &[u8]) -> Result<()> {
        let total_parts = body.len().div_ceil(CHUNK_SIZE);
        let mut completed_parts = Vec::with_capacity(total_parts);

        for (index, chunk) in body.chunks(CHUNK_SIZE).enumerate() {
            let part_number = index as i32 + 1;
            let part = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(ByteStream::from(chunk.to_vec()))
                .part_number(part_number)
                .send()
                .await
                .map_err(aws_sdk_s3::Error::from)?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(part.e_tag.unwrap_or_default())
                    .part_number(part_number)
                    .build(),
            );

            debug!(part_number, total_parts, "Uploaded part");
        }

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(())
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        warn!(key, upload_id, "Aborted multipart upload");
        Ok(())
    }
}

/// Runs `abort` when `result` failed. The caller always sees the original outcome.
async fn abort_on_failure<T, F, Fut>(result: Result<T>, abort: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if result.is_err() {
        if let Err(e) = abort().await {
            error!(error = %e, "Failed to abort multipart upload, parts may be left behind");
        }
    }
    result
}

#[async_trait]
impl ObjectStore for MinioStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        let size = body.len();
        if size > CHUNK_SIZE {
            self.upload_multipart(key, body, content_type).await?;
        } else {
            self.upload_single_part(key, body, content_type).await?;
        }
        debug!(key, size, "Object stored");
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        debug!(key, "Object deleted");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(&self.public_base_url, url)
    }
}

/// Process-local object store used by tests and by deployments without MinIO.
pub struct MemoryObjectStore {
    base_url: String,
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String> {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (content_type.to_string(), body));
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.objects.lock().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::not_found("object", key)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.base_url, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(&self.base_url, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn failed_upload_is_aborted_and_keeps_its_error() {
        let aborts = AtomicU32::new(0);
        let failed: Result<()> = Err(Error::Storage("part 2 rejected".into()));
        let outcome = abort_on_failure(failed, || async {
            aborts.fetch_add(1, Ordering::SeqCst);
            Err(Error::Storage("abort rejected".into()))
        })
        .await;
        assert!(matches!(outcome, Err(Error::Storage(msg)) if msg == "part 2 rejected"));
        assert_eq!(aborts.load(Ordering::SeqCst), 1);

        let done = abort_on_failure(Ok(7), || async {
            aborts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(done.unwrap(), 7);
        assert_eq!(aborts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn urls_round_trip_only_for_owned_objects() {
        let store = MemoryObjectStore::new("http://cdn.local/bucket/");
        let url = store.put("livestock/1_goat.jpg", vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(url, "http://cdn.local/bucket/livestock/1_goat.jpg");
        assert_eq!(store.key_from_url(&url).as_deref(), Some("livestock/1_goat.jpg"));
        assert_eq!(store.key_from_url("https://images.unsplash.com/x.jpg"), None);
        assert_eq!(store.key_from_url("http://cdn.local/bucket/"), None);
    }
}
