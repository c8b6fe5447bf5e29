use crate::errors::{AppError, AppResult};
use crate::models::PersistedSnapshot;
use crate::store::{AppState, SNAPSHOT_VERSION};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Durable "get/set/remove blob by key" storage.
pub trait BlobStore: Send + Sync {
    fn load(&self, key: &str) -> AppResult<Option<String>>;
    fn save(&self, key: &str, blob: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| AppError::Internal("blob store mutex poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> AppResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| AppError::Internal("blob store mutex poisoned".to_string()))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| AppError::Internal("blob store mutex poisoned".to_string()))?;
        blobs.remove(key);
        Ok(())
    }
}

/// Mirrors `AppState` into a blob store under one namespace key.
#[derive(Clone)]
pub struct SnapshotPersistor {
    store: Arc<dyn BlobStore>,
    key: String,
}

impl SnapshotPersistor {
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, state: &AppState) -> AppResult<()> {
        let blob = serde_json::to_string(&state.to_snapshot())?;
        self.store.save(&self.key, &blob)
    }

    /// Returns the stored state, or `None` when nothing usable is stored.
    /// Undecodable snapshots are logged and treated as absent.
    pub fn restore(&self) -> AppResult<Option<AppState>> {
        let Some(blob) = self.store.load(&self.key)? else {
            return Ok(None);
        };

        let snapshot = match serde_json::from_str::<PersistedSnapshot>(&blob) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(key = %self.key, error = %error, "ignoring undecodable snapshot");
                return Ok(None);
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                key = %self.key,
                version = snapshot.version,
                "ignoring snapshot with unsupported version"
            );
            return Ok(None);
        }

        Ok(Some(AppState::from_snapshot(snapshot)))
    }

    pub fn purge(&self) -> AppResult<()> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobStore, MemoryBlobStore, SnapshotPersistor};
    use crate::models::{ServiceLogFormValues, ServiceType};
    use crate::store::AppState;
    use std::sync::Arc;

    fn values() -> ServiceLogFormValues {
        ServiceLogFormValues {
            provider_id: "P-1".to_string(),
            service_order: "SO-1".to_string(),
            car_id: "CAR-1".to_string(),
            odometer: 12.5,
            engine_hours: 3.0,
            start_date: "2026-02-19".to_string(),
            end_date: "2026-02-20".to_string(),
            service_type: ServiceType::Unplanned,
            service_description: "Coolant flush and hose check".to_string(),
        }
    }

    #[test]
    fn saves_and_restores_state() {
        let store = Arc::new(MemoryBlobStore::new());
        let persistor = SnapshotPersistor::new(store.clone(), "medidrive-root");

        let mut state = AppState::new();
        state.drafts.create_draft(values());
        state.service_logs.create_service_log(values());
        persistor.save(&state).expect("save");

        let blob = store.load("medidrive-root").expect("load").expect("blob");
        assert!(blob.contains("\"activeDraftId\""));
        assert!(blob.contains("\"serviceLogs\""));

        let restored = persistor.restore().expect("restore").expect("state");
        assert_eq!(restored, state);
    }

    #[test]
    fn missing_or_corrupt_snapshot_restores_nothing() {
        let store = Arc::new(MemoryBlobStore::new());
        let persistor = SnapshotPersistor::new(store.clone(), "k");
        assert!(persistor.restore().expect("restore").is_none());

        store.save("k", "{not json").expect("save");
        assert!(persistor.restore().expect("restore").is_none());

        store
            .save(
                "k",
                r#"{"version":99,"drafts":{"items":{},"activeDraftId":null},"serviceLogs":{"items":[]}}"#,
            )
            .expect("save");
        assert!(persistor.restore().expect("restore").is_none());
    }

    #[test]
    fn purge_removes_snapshot() {
        let store = Arc::new(MemoryBlobStore::new());
        let persistor = SnapshotPersistor::new(store.clone(), "k");
        persistor.save(&AppState::new()).expect("save");
        persistor.purge().expect("purge");
        assert!(store.load("k").expect("load").is_none());
    }
}
