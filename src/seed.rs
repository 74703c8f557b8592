//! First-run sample data so a fresh install renders a non-empty viewer.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::models::{LetterRecord, PhotoRecord, VideoRecord};
use crate::store::{Collection, RecordStore, StoreError};

/// Initializes the data directory the first time the app runs: empty photo
/// and video documents, plus the two sample letters. An existing document,
/// corrupt or not, is left untouched.
pub async fn seed_initial_data(store: &RecordStore) -> Result<(), StoreError> {
    if !store.is_initialized(Collection::Photos).await? {
        store.save::<PhotoRecord>(Collection::Photos, &[]).await?;
    }
    if !store.is_initialized(Collection::Videos).await? {
        store.save::<VideoRecord>(Collection::Videos, &[]).await?;
    }
    seed_sample_letters(store).await
}

async fn seed_sample_letters(store: &RecordStore) -> Result<(), StoreError> {
    if store.is_initialized(Collection::Letters).await? {
        return Ok(());
    }

    let letters = sample_letters();
    store.save(Collection::Letters, &letters).await?;
    log::info!("Seeded {} sample letters", letters.len());
    Ok(())
}

fn sample_letters() -> Vec<LetterRecord> {
    vec![
        LetterRecord {
            id: 1,
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            title: "New Year, New Us".to_string(),
            content: "As we step into this new year together, I can't help but feel \
                      overwhelmed with gratitude for having you in my life. Every moment \
                      with you feels like a beautiful dream that I never want to wake up \
                      from. Here's to creating countless more memories together!"
                .to_string(),
            created_date: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        },
        LetterRecord {
            id: 2,
            date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
            title: "Six Months of Magic".to_string(),
            content: "It's been six incredible months since you walked into my life and \
                      changed everything. From our silly inside jokes to our deep midnight \
                      conversations, every moment has been perfect because it's been with \
                      you."
                .to_string(),
            created_date: Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 0).unwrap(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::memory_store;

    #[tokio::test]
    async fn seeds_once_and_never_again() {
        let store = memory_store();
        seed_initial_data(&store).await.unwrap();

        let letters: Vec<LetterRecord> = store.load(Collection::Letters).await.unwrap();
        assert_eq!(letters.len(), 2);

        // A second run must not duplicate the samples.
        seed_initial_data(&store).await.unwrap();
        let letters: Vec<LetterRecord> = store.load(Collection::Letters).await.unwrap();
        assert_eq!(letters.len(), 2);
    }

    #[tokio::test]
    async fn media_collections_start_as_empty_documents() {
        let store = memory_store();
        seed_initial_data(&store).await.unwrap();

        assert!(store.is_initialized(Collection::Photos).await.unwrap());
        assert!(store.is_initialized(Collection::Videos).await.unwrap());
        assert!(!store.is_initialized(Collection::Timeline).await.unwrap());

        let photos: Vec<PhotoRecord> = store.load(Collection::Photos).await.unwrap();
        assert!(photos.is_empty());
    }

    #[tokio::test]
    async fn an_existing_empty_document_is_respected() {
        let store = memory_store();
        // The author deleted every letter: the document exists and is empty.
        store
            .save::<LetterRecord>(Collection::Letters, &[])
            .await
            .unwrap();

        seed_initial_data(&store).await.unwrap();
        let letters: Vec<LetterRecord> = store.load(Collection::Letters).await.unwrap();
        assert!(letters.is_empty());
    }
}
