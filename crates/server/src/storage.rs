//! R2 (S3-compatible) storage client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::StorageError;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Upload/download client for the dataset bucket. Transfers are retried
/// with a fixed delay before giving up.
pub struct StorageClient {
    bucket: String,
    client: Client,
}

impl StorageClient {
    /// Build a client against the configured endpoint with static
    /// credentials. R2 uses the `auto` region; path-style addressing keeps
    /// bucket names out of DNS.
    pub async fn new(settings: &Settings) -> Self {
        let credentials = Credentials::new(
            settings.r2_access_key_id.clone(),
            settings.r2_secret_access_key.clone(),
            None,
            None,
            "recflow-static",
        );
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&settings.r2_endpoint_url)
            .region(aws_config::Region::new("auto"))
            .credentials_provider(credentials)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Self {
            bucket: settings.r2_bucket_name.clone(),
            client: Client::from_conf(config),
        }
    }

    /// Download an object to `local_path`, creating parent directories.
    pub async fn download_file(&self, key: &str, local_path: &Path) -> Result<PathBuf, StorageError> {
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError(format!("create {}: {err}", parent.display())))?;
        }
        info!(
            "Downloading s3://{}/{} -> {}",
            self.bucket,
            key,
            local_path.display()
        );

        let mut last_err = String::new();
        for attempt in 1..=MAX_RETRIES {
            match self.try_download(key, local_path).await {
                Ok(()) => return Ok(local_path.to_path_buf()),
                Err(err) => {
                    warn!("Download attempt {attempt}/{MAX_RETRIES} failed: {err}");
                    last_err = err;
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(StorageError(format!(
            "Download failed after {MAX_RETRIES} retries: {last_err}"
        )))
    }

    /// Upload a local file; returns the object key.
    pub async fn upload_file(&self, local_path: &Path, key: &str) -> Result<String, StorageError> {
        info!(
            "Uploading {} -> s3://{}/{}",
            local_path.display(),
            self.bucket,
            key
        );

        let mut last_err = String::new();
        for attempt in 1..=MAX_RETRIES {
            match self.try_upload(local_path, key).await {
                Ok(()) => return Ok(key.to_string()),
                Err(err) => {
                    warn!("Upload attempt {attempt}/{MAX_RETRIES} failed: {err}");
                    last_err = err;
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(StorageError(format!(
            "Upload failed after {MAX_RETRIES} retries: {last_err}"
        )))
    }

    async fn try_download(&self, key: &str, local_path: &Path) -> Result<(), String> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        let data = response
            .body
            .collect()
            .await
            .map_err(|err| err.to_string())?;
        tokio::fs::write(local_path, data.into_bytes())
            .await
            .map_err(|err| err.to_string())?;
        Ok(())
    }

    async fn try_upload(&self, local_path: &Path, key: &str) -> Result<(), String> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|err| err.to_string())?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        Ok(())
    }
}
