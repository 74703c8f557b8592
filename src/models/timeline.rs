use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Timeline events are append-only and carry no id, so there is nothing to
/// address a deletion by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEventRecord {
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
}

impl Record for TimelineEventRecord {
    fn id(&self) -> Option<u64> {
        None
    }

    fn assign_id(&mut self, _id: u64) {}
}
