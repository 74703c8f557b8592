//! Local-disk document backend: one pretty-printed JSON file per collection
//! under the data directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{Collection, DocumentBackend, StoreError};

pub struct LocalBackend {
    data_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn document_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection.key()))
    }
}

#[async_trait]
impl DocumentBackend for LocalBackend {
    async fn read(&self, collection: Collection) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.document_path(collection)).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write(&self, collection: Collection, body: String) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).await?;

        // Write to a sibling temp file and rename so a crash mid-write never
        // leaves a truncated document behind.
        let path = self.document_path(collection);
        let tmp = self.data_dir.join(format!(".{}.json.tmp", collection.key()));
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LetterRecord;
    use crate::store::RecordStore;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> RecordStore {
        RecordStore::new(Box::new(LocalBackend::new(dir.path().join("data"))))
    }

    fn letter(title: &str) -> LetterRecord {
        LetterRecord {
            id: 0,
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            title: title.to_string(),
            content: "body".to_string(),
            created_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_data_directory_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let letters: Vec<LetterRecord> = store
            .load(crate::store::Collection::Letters)
            .await
            .unwrap();
        assert!(letters.is_empty());
    }

    #[tokio::test]
    async fn round_trips_through_a_real_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let saved = store
            .append(crate::store::Collection::Letters, letter("Hello"))
            .await
            .unwrap();
        assert_eq!(saved.id, 1);

        let loaded: Vec<LetterRecord> = store
            .load(crate::store::Collection::Letters)
            .await
            .unwrap();
        assert_eq!(loaded, vec![saved]);
    }

    #[tokio::test]
    async fn documents_are_pretty_printed_for_human_inspection() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .append(crate::store::Collection::Letters, letter("Hello"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("data/letters.json")).unwrap();
        assert!(raw.contains('\n'), "expected indented output, got {}", raw);
    }

    #[tokio::test]
    async fn corrupt_file_surfaces_as_corrupt() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join("letters.json"), "[{\"id\": oops").unwrap();

        let store = store_in(&dir);
        let result = store
            .load::<LetterRecord>(crate::store::Collection::Letters)
            .await;
        assert!(matches!(
            result,
            Err(crate::store::StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn no_temp_file_left_after_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .append(crate::store::Collection::Letters, letter("Hello"))
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("data"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
