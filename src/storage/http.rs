use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};

use crate::reconcile::ReconcileError;
use crate::storage::BlobStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Client for a hosted object-storage HTTP API. Objects are written to
/// `{base}/object/{bucket}/{path}` and served publicly from
/// `{base}/object/public/{bucket}/{path}`.
pub struct HttpBlobStore {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: Option<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build storage HTTP client");

        HttpBlobStore {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ReconcileError> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);
        debug!(path, size = bytes.len(), "Uploading document to blob storage");

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            // Re-uploads for the same path overwrite rather than fail.
            .header("x-upsert", "true")
            .body(bytes);
        if let Some(key) = &self.service_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Blob storage transport failure");
            ReconcileError::StorageUnavailable(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(ReconcileError::StorageUnavailable(format!(
                "storage returned HTTP {}",
                response.status().as_u16()
            )));
        }

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_is_derived_from_bucket_and_path() {
        let store = HttpBlobStore::new("https://blobs.example/storage/v1/", "health-documents", None);
        assert_eq!(
            store.public_url("health-docs/abc/ofa-hips/1-report.pdf"),
            "https://blobs.example/storage/v1/object/public/health-documents/health-docs/abc/ofa-hips/1-report.pdf"
        );
    }
}
