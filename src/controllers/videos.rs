use actix_web::{HttpRequest, HttpResponse, Responder, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::blob::{BlobError, BlobStore, ResourceKind};
use crate::models::VideoRecord;
use crate::store::{Collection, RecordStore, StoreError};
use crate::view;

use super::{capability_from_request, require_author};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/videos")
            .route("", web::get().to(list_videos))
            .route("", web::post().to(upload_video))
            .route("/{index}", web::delete().to(delete_video)),
    );
}

#[derive(Debug, Serialize)]
struct ListVideosResponse {
    success: bool,
    videos: Vec<VideoRecord>,
    /// Viewer grid, two videos per row, newest first.
    rows: Vec<Vec<VideoRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn list_videos(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = capability_from_request(&data, &req) {
        return resp;
    }

    match data.store.load::<VideoRecord>(Collection::Videos).await {
        Ok(mut videos) => {
            view::sort_newest_first(&mut videos, |v| v.date);
            let rows = view::grid_rows(&videos, view::VIDEO_GRID_COLUMNS);
            HttpResponse::Ok().json(ListVideosResponse {
                success: true,
                videos,
                rows,
                error: None,
            })
        }
        Err(e) => {
            log::error!("Failed to load videos: {}", e);
            HttpResponse::InternalServerError().json(ListVideosResponse {
                success: false,
                videos: vec![],
                rows: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadVideoRequest {
    filename: String,
    date: NaiveDate,
    caption: String,
    data_base64: String,
}

#[derive(Debug, Serialize)]
struct UploadVideoResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn upload_error(status: actix_web::http::StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(UploadVideoResponse {
        success: false,
        video: None,
        error: Some(message),
    })
}

/// Videos are forwarded to the media service byte-for-byte; there is no
/// server-side transcoding and no inline storage variant.
async fn upload_video(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UploadVideoRequest>,
) -> impl Responder {
    use actix_web::http::StatusCode;

    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    let blob = match &data.blob {
        Some(blob) => blob,
        None => {
            return upload_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Media service not configured. Set CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET.".to_string(),
            );
        }
    };

    let caption = body.caption.trim().to_string();
    if caption.is_empty() || body.filename.trim().is_empty() || body.data_base64.is_empty() {
        return upload_error(
            StatusCode::BAD_REQUEST,
            "A video file and a caption are both required".to_string(),
        );
    }

    let raw = match BASE64.decode(&body.data_base64) {
        Ok(bytes) => bytes,
        Err(e) => {
            return upload_error(
                StatusCode::BAD_REQUEST,
                format!("Video payload is not valid base64: {}", e),
            );
        }
    };
    let file_size = raw.len() as u64;

    let upload = match blob
        .upload_media(raw, ResourceKind::Video, &body.filename)
        .await
    {
        Ok(upload) => upload,
        Err(e) => {
            log::error!("Video upload to media service failed: {}", e);
            return upload_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Media service upload failed: {}", e),
            );
        }
    };

    let record = VideoRecord {
        id: 0,
        original_name: body.filename.clone(),
        date: body.date,
        caption,
        upload_date: Utc::now(),
        file_size,
        url: upload.url,
        public_id: upload.public_id,
    };

    match data.store.append(Collection::Videos, record).await {
        Ok(video) => HttpResponse::Ok().json(UploadVideoResponse {
            success: true,
            video: Some(video),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to append video record: {}", e);
            upload_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save video record: {}", e),
            )
        }
    }
}

#[derive(Debug)]
pub(crate) enum DeleteVideoError {
    Store(StoreError),
    /// The record is gone but its blob could not be destroyed.
    Blob {
        public_id: String,
        source: BlobError,
    },
    BlobUnconfigured { public_id: String },
}

impl std::fmt::Display for DeleteVideoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteVideoError::Store(e) => write!(f, "{}", e),
            DeleteVideoError::Blob { public_id, source } => write!(
                f,
                "record removed, but deleting blob '{}' failed: {}",
                public_id, source
            ),
            DeleteVideoError::BlobUnconfigured { public_id } => write!(
                f,
                "record removed, but blob '{}' was left behind: media service not configured",
                public_id
            ),
        }
    }
}

pub(crate) async fn delete_video_record(
    store: &RecordStore,
    blob: Option<&dyn BlobStore>,
    index: usize,
) -> Result<VideoRecord, DeleteVideoError> {
    let removed: VideoRecord = store
        .remove_at(Collection::Videos, index)
        .await
        .map_err(DeleteVideoError::Store)?;

    let blob = blob.ok_or_else(|| DeleteVideoError::BlobUnconfigured {
        public_id: removed.public_id.clone(),
    })?;
    blob.destroy_media(&removed.public_id, ResourceKind::Video)
        .await
        .map_err(|source| DeleteVideoError::Blob {
            public_id: removed.public_id.clone(),
            source,
        })?;

    Ok(removed)
}

#[derive(Debug, Serialize)]
struct DeleteVideoResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<VideoRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn delete_video(
    data: web::Data<AppState>,
    req: HttpRequest,
    index: web::Path<usize>,
) -> impl Responder {
    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    match delete_video_record(&data.store, data.blob.as_deref(), *index).await {
        Ok(deleted) => HttpResponse::Ok().json(DeleteVideoResponse {
            success: true,
            deleted: Some(deleted),
            error: None,
        }),
        Err(DeleteVideoError::Store(StoreError::NotFound { .. })) => {
            HttpResponse::NotFound().json(DeleteVideoResponse {
                success: false,
                deleted: None,
                error: Some("No video at that index".to_string()),
            })
        }
        Err(e) => {
            log::error!("Failed to delete video: {}", e);
            HttpResponse::InternalServerError().json(DeleteVideoResponse {
                success: false,
                deleted: None,
                error: Some(e.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MediaUpload;
    use crate::store::test_support::memory_store;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockBlob {
        destroyed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for MockBlob {
        async fn upload_media(
            &self,
            _bytes: Vec<u8>,
            _kind: ResourceKind,
            _filename: &str,
        ) -> Result<MediaUpload, BlobError> {
            Ok(MediaUpload {
                url: "https://cdn.example/mock.mp4".to_string(),
                public_id: "mock/video".to_string(),
            })
        }

        async fn destroy_media(
            &self,
            public_id: &str,
            _kind: ResourceKind,
        ) -> Result<(), BlobError> {
            self.destroyed.lock().unwrap().push(public_id.to_string());
            Ok(())
        }

        async fn fetch_raw(&self, _key: &str) -> Result<Option<String>, BlobError> {
            Ok(None)
        }

        async fn put_raw(&self, _key: &str, _body: String) -> Result<(), BlobError> {
            Ok(())
        }
    }

    fn video() -> VideoRecord {
        VideoRecord {
            id: 0,
            original_name: "lake.mp4".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 9, 2).unwrap(),
            caption: "the lake".to_string(),
            upload_date: Utc::now(),
            file_size: 9000,
            url: "https://cdn.example/lake.mp4".to_string(),
            public_id: "keepsake/lake".to_string(),
        }
    }

    #[tokio::test]
    async fn deleting_a_video_destroys_its_blob() {
        let store = memory_store();
        let blob = MockBlob::default();
        store.append(Collection::Videos, video()).await.unwrap();

        delete_video_record(&store, Some(&blob as &dyn BlobStore), 0)
            .await
            .unwrap();
        assert_eq!(
            *blob.destroyed.lock().unwrap(),
            vec!["keepsake/lake".to_string()]
        );
    }

    #[tokio::test]
    async fn deleting_a_video_without_cloud_config_surfaces_the_orphan() {
        let store = memory_store();
        store.append(Collection::Videos, video()).await.unwrap();

        let result = delete_video_record(&store, None, 0).await;
        assert!(matches!(
            result,
            Err(DeleteVideoError::BlobUnconfigured { .. })
        ));
    }
}
