//! Presentation helpers: display ordering, grid pagination, and the
//! "surprise me" random pick. All of this is view logic layered on top of
//! the store's insertion order; the store itself never sorts.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::models::{LetterRecord, PhotoRecord, VideoRecord};

pub const PHOTO_GRID_COLUMNS: usize = 3;
pub const VIDEO_GRID_COLUMNS: usize = 2;

/// Stable sort, newest display date first. Records sharing a date keep
/// their insertion order.
pub fn sort_newest_first<T>(records: &mut [T], date: impl Fn(&T) -> NaiveDate) {
    records.sort_by(|a, b| date(b).cmp(&date(a)));
}

/// Stable sort, oldest first. Used by the timeline.
pub fn sort_oldest_first<T>(records: &mut [T], date: impl Fn(&T) -> NaiveDate) {
    records.sort_by(|a, b| date(a).cmp(&date(b)));
}

/// Chunks records into grid rows of `columns`; the last row may be short.
pub fn grid_rows<T: Clone>(records: &[T], columns: usize) -> Vec<Vec<T>> {
    records.chunks(columns).map(|row| row.to_vec()).collect()
}

/// One randomly chosen journal entry, tagged by kind so the viewer knows
/// how to render it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SurpriseMemory {
    Photo(PhotoRecord),
    Video(VideoRecord),
    Letter(LetterRecord),
}

/// Uniform pick across the union of all renderable entries: photos whose
/// media is resolvable, every video, every letter. `None` when the journal
/// is still empty.
pub fn pick_surprise(
    photos: Vec<PhotoRecord>,
    videos: Vec<VideoRecord>,
    letters: Vec<LetterRecord>,
) -> Option<SurpriseMemory> {
    let mut pool: Vec<SurpriseMemory> = Vec::new();
    pool.extend(
        photos
            .into_iter()
            .filter(|p| p.storage.is_resolvable())
            .map(SurpriseMemory::Photo),
    );
    pool.extend(videos.into_iter().map(SurpriseMemory::Video));
    pool.extend(letters.into_iter().map(SurpriseMemory::Letter));

    if pool.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..pool.len());
    Some(pool.swap_remove(index))
}
