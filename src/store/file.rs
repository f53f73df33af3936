use anyhow::Context;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{DocumentStore, Fields};
use crate::Result;

/// Document store keeping one JSON file per document under a root directory
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: &str, document_id: &str) -> Result<PathBuf> {
        validate_component(collection)?;
        validate_component(document_id)?;

        Ok(self.root.join(collection).join(format!("{}.json", document_id)))
    }
}

/// Ids become path components, so they must not escape the collection directory
fn validate_component(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');

    if !valid {
        anyhow::bail!("Invalid document store name: {:?}", name);
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn put(&self, collection: &str, document_id: &str, fields: Fields) -> Result<()> {
        let path = self.document_path(collection, document_id)?;
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Document path has no parent: {}", path.display()))?;
        fs_err::create_dir_all(dir)?;

        let content = serde_json::to_vec_pretty(&fields)?;

        // Readers only ever see a complete document: write aside, then rename over the target
        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to stage document in {}", dir.display()))?;
        staged.write_all(&content)?;
        staged.as_file().sync_all()?;
        staged
            .persist(&path)
            .with_context(|| format!("Failed to write document {}", path.display()))?;

        tracing::debug!("Wrote document {}", path.display());
        Ok(())
    }

    async fn get(&self, collection: &str, document_id: &str) -> Result<Option<Fields>> {
        let path = self.document_path(collection, document_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs_err::read_to_string(&path)?;
        let fields: Fields = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse document {}", path.display()))?;

        Ok(Some(fields))
    }

    fn store_name(&self) -> &'static str {
        "file store"
    }
}
