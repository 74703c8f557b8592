use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Where a photo's normalized payload lives. Exactly one variant per record,
/// disambiguated by the `storage_type` tag in the persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage_type", rename_all = "snake_case")]
pub enum PhotoStorage {
    /// Base64-encoded JPEG embedded in the record itself.
    Inline { data: String },
    /// JPEG file under the photos directory.
    Disk { path: String },
    /// Uploaded to the media service; `public_id` is the deletion handle.
    Blob { url: String, public_id: String },
}

impl PhotoStorage {
    /// Whether the viewer can actually render this photo.
    pub fn is_resolvable(&self) -> bool {
        match self {
            PhotoStorage::Inline { data } => !data.is_empty(),
            PhotoStorage::Disk { .. } | PhotoStorage::Blob { .. } => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: u64,
    pub original_name: String,
    /// Display date chosen by the author, not the upload time.
    pub date: NaiveDate,
    pub caption: String,
    pub upload_date: DateTime<Utc>,
    /// Byte size of the original upload, before normalization.
    pub file_size: u64,
    #[serde(flatten)]
    pub storage: PhotoStorage,
}

impl Record for PhotoRecord {
    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(storage: PhotoStorage) -> PhotoRecord {
        PhotoRecord {
            id: 1,
            original_name: "beach.jpg".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 7, 14).unwrap(),
            caption: "Sunset at the pier".to_string(),
            upload_date: DateTime::parse_from_rfc3339("2023-07-15T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            file_size: 120_000,
            storage,
        }
    }

    #[test]
    fn storage_type_tag_is_flattened_into_the_record() {
        let record = sample(PhotoStorage::Inline {
            data: "aGVsbG8=".to_string(),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["storage_type"], "inline");
        assert_eq!(json["data"], "aGVsbG8=");
        assert_eq!(json["date"], "2023-07-14");
    }

    #[test]
    fn blob_storage_round_trips() {
        let record = sample(PhotoStorage::Blob {
            url: "https://cdn.example/v1/beach.jpg".to_string(),
            public_id: "keepsake/abc123".to_string(),
        });
        let json = serde_json::to_string(&record).unwrap();
        let back: PhotoRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn empty_inline_payload_is_not_resolvable() {
        assert!(
            !PhotoStorage::Inline {
                data: String::new()
            }
            .is_resolvable()
        );
        assert!(
            PhotoStorage::Disk {
                path: "photos/x.jpg".to_string()
            }
            .is_resolvable()
        );
    }
}
