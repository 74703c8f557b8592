use std::fmt;
use std::path::Path;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::AppState;
use crate::blob::{BlobError, BlobStore, ResourceKind};
use crate::config::PhotoStorageMode;
use crate::media;
use crate::models::{PhotoRecord, PhotoStorage};
use crate::store::{Collection, RecordStore, StoreError};
use crate::view;

use super::{capability_from_request, require_author};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/photos")
            .route("", web::get().to(list_photos))
            .route("", web::post().to(upload_photo))
            .route("/{index}", web::delete().to(delete_photo))
            .route("/{index}/file", web::get().to(photo_file)),
    );
}

#[derive(Debug, Serialize)]
struct ListPhotosResponse {
    success: bool,
    photos: Vec<PhotoRecord>,
    /// Viewer grid, three photos per row, newest first.
    rows: Vec<Vec<PhotoRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// List photos sorted newest-first, with the grid rows the viewer renders.
async fn list_photos(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = capability_from_request(&data, &req) {
        return resp;
    }

    match data.store.load::<PhotoRecord>(Collection::Photos).await {
        Ok(mut photos) => {
            view::sort_newest_first(&mut photos, |p| p.date);
            let rows = view::grid_rows(&photos, view::PHOTO_GRID_COLUMNS);
            HttpResponse::Ok().json(ListPhotosResponse {
                success: true,
                photos,
                rows,
                error: None,
            })
        }
        Err(e) => {
            log::error!("Failed to load photos: {}", e);
            HttpResponse::InternalServerError().json(ListPhotosResponse {
                success: false,
                photos: vec![],
                rows: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadPhotoRequest {
    filename: String,
    date: NaiveDate,
    caption: String,
    /// Base64 of the original upload; normalized server-side before storage.
    data_base64: String,
}

#[derive(Debug, Serialize)]
struct UploadPhotoResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<PhotoRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn upload_error(status: actix_web::http::StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(UploadPhotoResponse {
        success: false,
        photo: None,
        width: None,
        height: None,
        error: Some(message),
    })
}

async fn upload_photo(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UploadPhotoRequest>,
) -> impl Responder {
    use actix_web::http::StatusCode;

    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    let caption = body.caption.trim().to_string();
    if caption.is_empty() || body.filename.trim().is_empty() || body.data_base64.is_empty() {
        return upload_error(
            StatusCode::BAD_REQUEST,
            "A photo file and a caption are both required".to_string(),
        );
    }

    let raw = match BASE64.decode(&body.data_base64) {
        Ok(bytes) => bytes,
        Err(e) => {
            return upload_error(
                StatusCode::BAD_REQUEST,
                format!("Photo payload is not valid base64: {}", e),
            );
        }
    };
    let file_size = raw.len() as u64;

    let normalized = match media::normalize(&raw) {
        Ok(n) => n,
        Err(e) => {
            log::warn!("Rejected photo '{}': {}", body.filename, e);
            return upload_error(
                StatusCode::BAD_REQUEST,
                format!("Could not process photo: {}", e),
            );
        }
    };

    let upload_date = Utc::now();
    let storage = match data.config.photo_storage {
        PhotoStorageMode::Inline => PhotoStorage::Inline {
            data: BASE64.encode(&normalized.jpeg),
        },
        PhotoStorageMode::Disk => {
            let name = format!(
                "{}_{}",
                upload_date.format("%Y%m%d_%H%M%S"),
                safe_filename(&body.filename)
            );
            let path = data.config.photos_dir.join(name);
            if let Err(e) = fs::create_dir_all(&data.config.photos_dir).await {
                log::error!("Could not create photos directory: {}", e);
                return upload_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store photo on disk".to_string(),
                );
            }
            if let Err(e) = fs::write(&path, &normalized.jpeg).await {
                log::error!("Could not write photo file {}: {}", path.display(), e);
                return upload_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store photo on disk".to_string(),
                );
            }
            PhotoStorage::Disk {
                path: path.to_string_lossy().to_string(),
            }
        }
        PhotoStorageMode::Cloud => {
            let blob = match &data.blob {
                Some(blob) => blob,
                None => {
                    return upload_error(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Media service not configured. Set CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET.".to_string(),
                    );
                }
            };
            match blob
                .upload_media(normalized.jpeg.clone(), ResourceKind::Image, &body.filename)
                .await
            {
                Ok(upload) => PhotoStorage::Blob {
                    url: upload.url,
                    public_id: upload.public_id,
                },
                Err(e) => {
                    log::error!("Photo upload to media service failed: {}", e);
                    return upload_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Media service upload failed: {}", e),
                    );
                }
            }
        }
    };

    let record = PhotoRecord {
        id: 0,
        original_name: body.filename.clone(),
        date: body.date,
        caption,
        upload_date,
        file_size,
        storage,
    };

    match data.store.append(Collection::Photos, record).await {
        Ok(photo) => HttpResponse::Ok().json(UploadPhotoResponse {
            success: true,
            photo: Some(photo),
            width: Some(normalized.width),
            height: Some(normalized.height),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to append photo record: {}", e);
            upload_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save photo record: {}", e),
            )
        }
    }
}

/// Keep only the final path component of a client-supplied filename.
fn safe_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload.jpg".to_string())
}

/// Serve the bytes of a disk-stored photo by its collection position.
async fn photo_file(
    data: web::Data<AppState>,
    req: HttpRequest,
    index: web::Path<usize>,
) -> impl Responder {
    if let Err(resp) = capability_from_request(&data, &req) {
        return resp;
    }

    let photos = match data.store.load::<PhotoRecord>(Collection::Photos).await {
        Ok(photos) => photos,
        Err(e) => {
            log::error!("Failed to load photos: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": e.to_string() }));
        }
    };

    let photo = match photos.get(*index) {
        Some(photo) => photo,
        None => {
            return HttpResponse::NotFound()
                .json(serde_json::json!({ "error": "No photo at that index" }));
        }
    };

    match &photo.storage {
        PhotoStorage::Disk { path } => match fs::read(path).await {
            Ok(bytes) => HttpResponse::Ok().content_type("image/jpeg").body(bytes),
            Err(e) => {
                log::error!("Could not read photo file {}: {}", path, e);
                HttpResponse::NotFound()
                    .json(serde_json::json!({ "error": "Photo file is missing" }))
            }
        },
        PhotoStorage::Inline { data } => match BASE64.decode(data) {
            Ok(bytes) => HttpResponse::Ok().content_type("image/jpeg").body(bytes),
            Err(e) => {
                log::error!("Inline photo payload is not valid base64: {}", e);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Stored photo payload is corrupt" }))
            }
        },
        PhotoStorage::Blob { url, .. } => HttpResponse::Found()
            .append_header(("Location", url.as_str()))
            .finish(),
    }
}

#[derive(Debug)]
pub(crate) enum DeleteError {
    Store(StoreError),
    /// The record is gone but its blob could not be destroyed.
    Blob {
        public_id: String,
        source: BlobError,
    },
    /// The record is gone but the media service was never configured.
    BlobUnconfigured { public_id: String },
    /// The record is gone but its backing file could not be removed.
    File {
        path: String,
        source: std::io::Error,
    },
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteError::Store(e) => write!(f, "{}", e),
            DeleteError::Blob { public_id, source } => write!(
                f,
                "record removed, but deleting blob '{}' failed: {}",
                public_id, source
            ),
            DeleteError::BlobUnconfigured { public_id } => write!(
                f,
                "record removed, but blob '{}' was left behind: media service not configured",
                public_id
            ),
            DeleteError::File { path, source } => write!(
                f,
                "record removed, but deleting file '{}' failed: {}",
                path, source
            ),
        }
    }
}

/// Removes one photo record and cascades to the media it exclusively owns.
/// The document rewrite happens first; a cascade failure is surfaced rather
/// than swallowed, so an orphaned blob is always visible to the operator.
pub(crate) async fn delete_photo_record(
    store: &RecordStore,
    blob: Option<&dyn BlobStore>,
    index: usize,
) -> Result<PhotoRecord, DeleteError> {
    let removed: PhotoRecord = store
        .remove_at(Collection::Photos, index)
        .await
        .map_err(DeleteError::Store)?;

    match &removed.storage {
        PhotoStorage::Inline { .. } => {}
        PhotoStorage::Disk { path } => match fs::remove_file(path).await {
            Ok(()) => {}
            // Already gone is fine; the goal was for it not to exist.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DeleteError::File {
                    path: path.clone(),
                    source: e,
                });
            }
        },
        PhotoStorage::Blob { public_id, .. } => {
            let blob = blob.ok_or_else(|| DeleteError::BlobUnconfigured {
                public_id: public_id.clone(),
            })?;
            blob.destroy_media(public_id, ResourceKind::Image)
                .await
                .map_err(|source| DeleteError::Blob {
                    public_id: public_id.clone(),
                    source,
                })?;
        }
    }

    Ok(removed)
}

#[derive(Debug, Serialize)]
struct DeletePhotoResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<PhotoRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn delete_photo(
    data: web::Data<AppState>,
    req: HttpRequest,
    index: web::Path<usize>,
) -> impl Responder {
    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    match delete_photo_record(&data.store, data.blob.as_deref(), *index).await {
        Ok(deleted) => HttpResponse::Ok().json(DeletePhotoResponse {
            success: true,
            deleted: Some(deleted),
            error: None,
        }),
        Err(DeleteError::Store(StoreError::NotFound { .. })) => {
            HttpResponse::NotFound().json(DeletePhotoResponse {
                success: false,
                deleted: None,
                error: Some("No photo at that index".to_string()),
            })
        }
        Err(e) => {
            log::error!("Failed to delete photo: {}", e);
            HttpResponse::InternalServerError().json(DeletePhotoResponse {
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
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockBlob {
        destroyed: Mutex<Vec<String>>,
        fail_destroy: bool,
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
                url: "https://cdn.example/mock".to_string(),
                public_id: "mock/upload".to_string(),
            })
        }

        async fn destroy_media(
            &self,
            public_id: &str,
            _kind: ResourceKind,
        ) -> Result<(), BlobError> {
            if self.fail_destroy {
                return Err(BlobError::Response("simulated outage".to_string()));
            }
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

    fn photo_with(storage: PhotoStorage) -> PhotoRecord {
        PhotoRecord {
            id: 0,
            original_name: "pier.jpg".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
            caption: "the pier".to_string(),
            upload_date: Utc::now(),
            file_size: 42,
            storage,
        }
    }

    #[tokio::test]
    async fn deleting_a_blob_photo_issues_exactly_one_destroy() {
        let store = memory_store();
        let blob = MockBlob::default();
        store
            .append(
                Collection::Photos,
                photo_with(PhotoStorage::Blob {
                    url: "https://cdn.example/pier.jpg".to_string(),
                    public_id: "keepsake/pier".to_string(),
                }),
            )
            .await
            .unwrap();

        let removed = delete_photo_record(&store, Some(&blob as &dyn BlobStore), 0)
            .await
            .unwrap();
        assert_eq!(removed.id, 1);
        assert_eq!(
            *blob.destroyed.lock().unwrap(),
            vec!["keepsake/pier".to_string()]
        );

        let remaining: Vec<PhotoRecord> = store.load(Collection::Photos).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_disk_photo_removes_its_backing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("20230801_120000_pier.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let store = memory_store();
        store
            .append(
                Collection::Photos,
                photo_with(PhotoStorage::Disk {
                    path: path.to_string_lossy().to_string(),
                }),
            )
            .await
            .unwrap();

        delete_photo_record(&store, None, 0).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn an_already_absent_backing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-written.jpg");

        let store = memory_store();
        store
            .append(
                Collection::Photos,
                photo_with(PhotoStorage::Disk {
                    path: path.to_string_lossy().to_string(),
                }),
            )
            .await
            .unwrap();

        let removed = delete_photo_record(&store, None, 0).await.unwrap();
        assert_eq!(removed.id, 1);
    }

    #[tokio::test]
    async fn a_failed_blob_destroy_is_surfaced_not_swallowed() {
        let store = memory_store();
        let blob = MockBlob {
            fail_destroy: true,
            ..Default::default()
        };
        store
            .append(
                Collection::Photos,
                photo_with(PhotoStorage::Blob {
                    url: "https://cdn.example/pier.jpg".to_string(),
                    public_id: "keepsake/pier".to_string(),
                }),
            )
            .await
            .unwrap();

        let result = delete_photo_record(&store, Some(&blob as &dyn BlobStore), 0).await;
        assert!(matches!(result, Err(DeleteError::Blob { .. })));
        // The record itself is gone; the error is the operator's signal that
        // the blob needs manual cleanup.
        let remaining: Vec<PhotoRecord> = store.load(Collection::Photos).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_delete_is_not_found() {
        let store = memory_store();
        let result = delete_photo_record(&store, None, 3).await;
        assert!(matches!(
            result,
            Err(DeleteError::Store(StoreError::NotFound { index: 3, .. }))
        ));
    }

    #[test]
    fn safe_filename_strips_directory_components() {
        assert_eq!(safe_filename("../../etc/passwd"), "passwd");
        assert_eq!(safe_filename("beach.jpg"), "beach.jpg");
        assert_eq!(safe_filename(""), "upload.jpg");
    }
}
