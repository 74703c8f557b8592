//! Signed REST client for the Cloudinary-style media API.
//!
//! Media uploads go through `POST /v1_1/<cloud>/<resource_type>/upload` with
//! an SHA-1 request signature; raw collection documents are addressed by a
//! deterministic `public_id` so their delivery URL is predictable.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::CloudConfig;
use crate::http::shared_client;

use super::{BlobError, BlobStore, MediaUpload, ResourceKind};

pub struct CloudinaryStore {
    config: CloudConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudConfig) -> Self {
        Self { config }
    }

    fn api_url(&self, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.api_base,
            self.config.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Request signature: the sorted `key=value` pairs joined with `&`,
    /// concatenated with the API secret, hashed with SHA-1. The `file` and
    /// `api_key` parameters are never part of the signature.
    fn signature(&self, params: &[(&str, &str)]) -> String {
        sign_request(params, &self.config.api_secret)
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, String)],
    ) -> Result<reqwest::Response, BlobError> {
        let response = shared_client().post(url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

pub(crate) fn sign_request(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted: Vec<(&str, &str)> = params.to_vec();
    sorted.sort_by_key(|&(k, _)| k);
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn data_uri(kind: ResourceKind, bytes: &[u8]) -> String {
    let mime = match kind {
        ResourceKind::Image => "image/jpeg",
        ResourceKind::Video => "application/octet-stream",
        ResourceKind::Raw => "application/json",
    };
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

#[async_trait]
impl BlobStore for CloudinaryStore {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        kind: ResourceKind,
        filename: &str,
    ) -> Result<MediaUpload, BlobError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.signature(&[
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        log::info!(
            "Uploading {} '{}' ({} bytes) to media service",
            kind.as_str(),
            filename,
            bytes.len()
        );

        let form = [
            ("file", data_uri(kind, &bytes)),
            ("folder", self.config.folder.clone()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];
        let response = self
            .post_form(&self.api_url(kind, "upload"), &form)
            .await?;

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Response(e.to_string()))?;
        Ok(MediaUpload {
            url: upload.secure_url,
            public_id: upload.public_id,
        })
    }

    async fn destroy_media(&self, public_id: &str, kind: ResourceKind) -> Result<(), BlobError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.signature(&[
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ]);

        let form = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];
        let response = self
            .post_form(&self.api_url(kind, "destroy"), &form)
            .await?;

        let destroy: DestroyResponse = response
            .json()
            .await
            .map_err(|e| BlobError::Response(e.to_string()))?;
        // "not found" means the blob is already gone, which is what we wanted.
        match destroy.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(BlobError::Response(format!(
                "destroy of '{}' returned '{}'",
                public_id, other
            ))),
        }
    }

    async fn fetch_raw(&self, key: &str) -> Result<Option<String>, BlobError> {
        let url = format!(
            "{}/{}/raw/upload/{}/{}",
            self.config.delivery_base, self.config.cloud_name, self.config.folder, key
        );
        let response = shared_client().get(&url).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(response.text().await?))
    }

    async fn put_raw(&self, key: &str, body: String) -> Result<(), BlobError> {
        let public_id = format!("{}/{}", self.config.folder, key);
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.signature(&[
            ("invalidate", "true"),
            ("overwrite", "true"),
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let form = [
            ("file", data_uri(ResourceKind::Raw, body.as_bytes())),
            ("public_id", public_id),
            ("overwrite", "true".to_string()),
            ("invalidate", "true".to_string()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];
        self.post_form(&self.api_url(ResourceKind::Raw, "upload"), &form)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_and_order_insensitive() {
        let a = sign_request(&[("timestamp", "1700000000"), ("folder", "keepsake")], "s3cret");
        let b = sign_request(&[("folder", "keepsake"), ("timestamp", "1700000000")], "s3cret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_the_secret() {
        let a = sign_request(&[("timestamp", "1700000000")], "secret-one");
        let b = sign_request(&[("timestamp", "1700000000")], "secret-two");
        assert_ne!(a, b);
    }

    #[test]
    fn data_uri_carries_the_expected_mime() {
        assert!(data_uri(ResourceKind::Image, b"x").starts_with("data:image/jpeg;base64,"));
        assert!(data_uri(ResourceKind::Raw, b"[]").starts_with("data:application/json;base64,"));
    }
}
