//! Remote document backend: each collection document is a raw object in the
//! media service, fetched over its public delivery URL and rewritten in full
//! through the signed upload API.

use std::sync::Arc;

use async_trait::async_trait;

use crate::blob::BlobStore;

use super::{Collection, DocumentBackend, StoreError};

pub struct RemoteBackend {
    blob: Arc<dyn BlobStore>,
}

impl RemoteBackend {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    fn object_key(collection: Collection) -> String {
        format!("{}.json", collection.key())
    }
}

#[async_trait]
impl DocumentBackend for RemoteBackend {
    async fn read(&self, collection: Collection) -> Result<Option<String>, StoreError> {
        self.blob
            .fetch_raw(&Self::object_key(collection))
            .await
            .map_err(|e| StoreError::Remote(e.to_string()))
    }

    async fn write(&self, collection: Collection, body: String) -> Result<(), StoreError> {
        self.blob
            .put_raw(&Self::object_key(collection), body)
            .await
            .map_err(|e| StoreError::Remote(e.to_string()))
    }
}
