use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterRecord {
    pub id: u64,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    pub created_date: DateTime<Utc>,
}

impl Record for LetterRecord {
    fn id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn assign_id(&mut self, id: u64) {
        self.id = id;
    }
}
