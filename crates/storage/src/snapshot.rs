use std::sync::Arc;

use anyhow::{Context, Result};
use shared::protocol::{StoredSnapshot, SNAPSHOT_STORAGE_KEY};
use tracing::{debug, warn};

use crate::KeyValueStore;

#[derive(Clone)]
pub struct SnapshotPersistence {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SnapshotPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, SNAPSHOT_STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Overwrites the stored document with `snapshot`.
    pub async fn save(&self, snapshot: &StoredSnapshot) -> Result<()> {
        let encoded = snapshot
            .to_json()
            .context("failed to encode report snapshot")?;
        self.store.set(&self.key, &encoded).await?;
        debug!(
            key = %self.key,
            fields = snapshot.fields.len(),
            files = snapshot.uploaded_file_names.len(),
            "report snapshot saved"
        );
        Ok(())
    }

    /// Reads the stored document. Missing, unreadable and malformed data all
    /// come back as `None`; the cause is logged.
    pub async fn load(&self) -> Option<StoredSnapshot> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read stored report snapshot");
                return None;
            }
        };

        match StoredSnapshot::from_json(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding malformed report snapshot");
                None
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await?;
        debug!(key = %self.key, "report snapshot cleared");
        Ok(())
    }
}
