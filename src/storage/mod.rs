pub mod http;

use async_trait::async_trait;

use crate::reconcile::ReconcileError;

pub use http::HttpBlobStore;

/// Blob storage for uploaded health documents. Accepts images and PDFs;
/// returns a durable public URL for each stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ReconcileError>;

    fn public_url(&self, path: &str) -> String;
}
