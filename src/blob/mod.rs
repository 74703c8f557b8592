//! Client for the external media-hosting service.
//!
//! The service is treated as an opaque blob store: media uploads return a
//! delivery URL plus an opaque deletion handle, and "raw" objects hold the
//! JSON collection documents for the cloud-backed deployment.

pub mod cloudinary;

use std::fmt;

use async_trait::async_trait;

pub use cloudinary::CloudinaryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Video,
    Raw,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
            ResourceKind::Raw => "raw",
        }
    }
}

/// Result of a successful media upload.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub url: String,
    /// Opaque handle used to delete the blob later.
    pub public_id: String,
}

#[derive(Debug)]
pub enum BlobError {
    Http(reqwest::Error),
    Status { status: u16, body: String },
    Response(String),
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::Http(e) => write!(f, "media service request failed: {}", e),
            BlobError::Status { status, body } => {
                write!(f, "media service returned HTTP {}: {}", status, body)
            }
            BlobError::Response(msg) => write!(f, "unexpected media service response: {}", msg),
        }
    }
}

impl std::error::Error for BlobError {}

impl From<reqwest::Error> for BlobError {
    fn from(e: reqwest::Error) -> Self {
        BlobError::Http(e)
    }
}

/// Upload/delete for media files, plus raw-document access for the
/// cloud-backed record store. No retries anywhere: a failed round trip
/// surfaces to the caller immediately.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        kind: ResourceKind,
        filename: &str,
    ) -> Result<MediaUpload, BlobError>;

    async fn destroy_media(&self, public_id: &str, kind: ResourceKind) -> Result<(), BlobError>;

    /// Fetches a raw document by key. `None` when the object does not exist.
    async fn fetch_raw(&self, key: &str) -> Result<Option<String>, BlobError>;

    /// Uploads a raw document under a deterministic key, overwriting any
    /// prior object and invalidating cached copies.
    async fn put_raw(&self, key: &str, body: String) -> Result<(), BlobError>;
}
