//! JSON-document record store with pluggable backing.
//!
//! Each collection is one ordered JSON array persisted as a whole document:
//! there is no partial update, every mutation is a full read-modify-write
//! cycle. A per-collection lock makes that cycle safe against concurrent
//! in-process writers; concurrent writers in *other* processes still race
//! (last save wins), which is acceptable for a single-household deployment.

pub mod local;
pub mod remote;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// The four named collections. `key()` doubles as the file stem for the
/// local backend and the raw object key for the remote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Photos,
    Videos,
    Letters,
    Timeline,
}

impl Collection {
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Photos => "photos",
            Collection::Videos => "videos",
            Collection::Letters => "letters",
            Collection::Timeline => "timeline",
        }
    }

    fn index(&self) -> usize {
        match self {
            Collection::Photos => 0,
            Collection::Videos => 1,
            Collection::Letters => 2,
            Collection::Timeline => 3,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A record that can live in a collection. Timeline events have no id;
/// everything else gets one assigned on append.
pub trait Record: Serialize + DeserializeOwned + Clone + Send {
    fn id(&self) -> Option<u64>;
    fn assign_id(&mut self, id: u64);
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    /// The backing document exists but does not parse. Distinct from
    /// "absent" so corruption shows up as an error, not an empty gallery.
    Corrupt {
        collection: Collection,
        source: serde_json::Error,
    },
    Serialize(serde_json::Error),
    Remote(String),
    NotFound {
        collection: Collection,
        index: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Corrupt { collection, source } => {
                write!(f, "stored document for '{}' is corrupt: {}", collection, source)
            }
            StoreError::Serialize(e) => write!(f, "failed to serialize records: {}", e),
            StoreError::Remote(msg) => write!(f, "remote document store error: {}", msg),
            StoreError::NotFound { collection, index } => {
                write!(f, "no record at index {} in '{}'", index, collection)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Raw document access: the full serialized body of one collection.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// `None` means the collection has never been saved.
    async fn read(&self, collection: Collection) -> Result<Option<String>, StoreError>;

    /// Full overwrite of the backing document.
    async fn write(&self, collection: Collection, body: String) -> Result<(), StoreError>;
}

pub struct RecordStore {
    backend: Box<dyn DocumentBackend>,
    // One lock per collection, guarding the load-mutate-save cycle.
    locks: [Mutex<()>; 4],
}

impl RecordStore {
    pub fn new(backend: Box<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            locks: [
                Mutex::new(()),
                Mutex::new(()),
                Mutex::new(()),
                Mutex::new(()),
            ],
        }
    }

    /// Loads the persisted sequence for a collection. A never-saved
    /// collection is an empty sequence; a document that exists but fails to
    /// parse is a `Corrupt` error.
    pub async fn load<T: Record>(&self, collection: Collection) -> Result<Vec<T>, StoreError> {
        match self.backend.read(collection).await? {
            None => Ok(Vec::new()),
            Some(body) => serde_json::from_str(&body)
                .map_err(|source| StoreError::Corrupt { collection, source }),
        }
    }

    /// Serializes the full ordered sequence and overwrites the backing
    /// document. Pretty-printed so the local files stay human-readable.
    pub async fn save<T: Record>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
        self.backend.write(collection, body).await
    }

    /// Whether the collection has ever been saved, corrupt or not.
    pub async fn is_initialized(&self, collection: Collection) -> Result<bool, StoreError> {
        Ok(self.backend.read(collection).await?.is_some())
    }

    /// Appends one record, assigning it the next id first. Ids are
    /// `max(existing) + 1`, so an id freed by a deletion is never handed out
    /// again while a higher one is in use.
    pub async fn append<T: Record>(
        &self,
        collection: Collection,
        mut record: T,
    ) -> Result<T, StoreError> {
        let _guard = self.locks[collection.index()].lock().await;

        let mut records: Vec<T> = self.load(collection).await?;
        let next_id = records.iter().filter_map(Record::id).max().unwrap_or(0) + 1;
        record.assign_id(next_id);
        records.push(record.clone());
        self.save(collection, &records).await?;
        Ok(record)
    }

    /// Removes exactly one record by position and rewrites the collection.
    /// Returns the removed record so the caller can cascade any media it
    /// owns; the store itself never talks to the blob store.
    pub async fn remove_at<T: Record>(
        &self,
        collection: Collection,
        index: usize,
    ) -> Result<T, StoreError> {
        let _guard = self.locks[collection.index()].lock().await;

        let mut records: Vec<T> = self.load(collection).await?;
        if index >= records.len() {
            return Err(StoreError::NotFound { collection, index });
        }
        let removed = records.remove(index);
        self.save(collection, &records).await?;
        Ok(removed)
    }
}
