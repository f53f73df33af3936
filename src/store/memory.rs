use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DocumentStore, Fields};
use crate::Result;

/// In-process document store, mostly for tests and embedding
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Fields>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: &str, document_id: &str, fields: Fields) -> Result<()> {
        self.documents
            .write()
            .await
            .insert((collection.to_string(), document_id.to_string()), fields);
        Ok(())
    }

    async fn get(&self, collection: &str, document_id: &str) -> Result<Option<Fields>> {
        let key = (collection.to_string(), document_id.to_string());
        Ok(self.documents.read().await.get(&key).cloned())
    }

    fn store_name(&self) -> &'static str {
        "memory store"
    }
}
