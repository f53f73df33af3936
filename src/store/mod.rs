use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod file;
pub mod memory;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use crate::Result;

/// Field mapping of one stored document
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Key-value document store seam
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace a document
    async fn put(&self, collection: &str, document_id: &str, fields: Fields) -> Result<()>;

    /// Read a document, `None` when it does not exist
    async fn get(&self, collection: &str, document_id: &str) -> Result<Option<Fields>>;

    /// Get the name of this store
    fn store_name(&self) -> &'static str;
}

/// The persisted "last comparison" record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredComparison {
    /// CSV text including its header row
    pub csv: String,

    /// Session that wrote the slot
    pub session_id: Uuid,

    /// When the slot was written
    pub updated_at: DateTime<Utc>,
}

/// Single-slot store for the most recent CSV comparison.
///
/// Writes are last-write-wins; no version check happens before an overwrite.
#[derive(Clone)]
pub struct ResultStore {
    store: Arc<dyn DocumentStore>,
    collection: String,
    document_id: String,
}

impl ResultStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            document_id: document_id.into(),
        }
    }

    /// Overwrite the slot with a new comparison
    pub async fn put(&self, csv: &str, session_id: Uuid) -> Result<StoredComparison> {
        let record = StoredComparison {
            csv: csv.to_string(),
            session_id,
            updated_at: Utc::now(),
        };

        let fields = match serde_json::to_value(&record)? {
            serde_json::Value::Object(fields) => fields,
            other => anyhow::bail!("Stored comparison serialized to a non-object: {}", other),
        };

        tracing::info!(
            "Saving last comparison to {} ({}/{})",
            self.store.store_name(),
            self.collection,
            self.document_id
        );
        self.store
            .put(&self.collection, &self.document_id, fields)
            .await?;

        Ok(record)
    }

    /// Read the slot back
    pub async fn get(&self) -> Result<Option<StoredComparison>> {
        let Some(fields) = self.store.get(&self.collection, &self.document_id).await? else {
            tracing::debug!("No stored comparison in {}/{}", self.collection, self.document_id);
            return Ok(None);
        };

        let record = serde_json::from_value(serde_json::Value::Object(fields))
            .context("Stored comparison has an unexpected shape")?;

        Ok(Some(record))
    }
}
