use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::error::StorageError;
use crate::types::{RegistryEntry, RegistryPatch};

/// Where registry entries live. The health checker only talks to this trait.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<RegistryEntry>, StorageError>;

    async fn get(&self, id: &str) -> Result<Option<RegistryEntry>, StorageError>;

    async fn update(&self, id: &str, patch: &RegistryPatch) -> Result<RegistryEntry, StorageError>;

    async fn replace_all(&self, entries: Vec<RegistryEntry>) -> Result<(), StorageError>;
}

/// On-disk layout: `{"apis": [...]}` plus whatever other top-level keys the
/// file already has.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    apis: Vec<RegistryEntry>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

pub struct JsonFileRegistry {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: AsyncMutex<()>,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<RegistryDocument, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write_document(&self, document: &RegistryDocument) -> Result<(), StorageError> {
        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');

        // Write next to the target and rename so readers never see a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), entries = document.apis.len(), "registry written");
        Ok(())
    }
}

#[async_trait]
impl RegistryStore for JsonFileRegistry {
    async fn list(&self) -> Result<Vec<RegistryEntry>, StorageError> {
        Ok(self.read_document().await?.apis)
    }

    async fn get(&self, id: &str) -> Result<Option<RegistryEntry>, StorageError> {
        let document = self.read_document().await?;
        Ok(document.apis.into_iter().find(|api| api.id == id))
    }

    async fn update(&self, id: &str, patch: &RegistryPatch) -> Result<RegistryEntry, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        let entry = document
            .apis
            .iter_mut()
            .find(|api| api.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        entry.apply(patch);
        let updated = entry.clone();

        self.write_document(&document).await?;
        Ok(updated)
    }

    async fn replace_all(&self, entries: Vec<RegistryEntry>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => RegistryDocument::default(),
            Err(e) => return Err(e),
        };
        document.apis = entries;

        self.write_document(&document).await
    }
}

/// Registry held in memory, in insertion order.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: Mutex<Vec<RegistryEntry>>,
}

impl InMemoryRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

#[async_trait]
impl RegistryStore for InMemoryRegistry {
    async fn list(&self) -> Result<Vec<RegistryEntry>, StorageError> {
        Ok(self.entries.lock().unwrap().clone())
    }

    async fn get(&self, id: &str) -> Result<Option<RegistryEntry>, StorageError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|api| api.id == id).cloned())
    }

    async fn update(&self, id: &str, patch: &RegistryPatch) -> Result<RegistryEntry, StorageError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .iter_mut()
            .find(|api| api.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        entry.apply(patch);
        Ok(entry.clone())
    }

    async fn replace_all(&self, entries: Vec<RegistryEntry>) -> Result<(), StorageError> {
        *self.entries.lock().unwrap() = entries;
        Ok(())
    }
}
