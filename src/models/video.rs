use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Videos are never embedded; they always live in the media service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: u64,
    pub original_name: String,
    pub date: NaiveDate,
    pub caption: String,
    pub upload_date: DateTime<Utc>,
    pub file_size: u64,
    pub url: String,
    /// Deletion handle returned by the media service at upload time.
    pub public_id: String,
}

impl Record for VideoRecord {
    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}
