//! Typed access to the settings schema.

use linkpeek_types::config::DetectionConfig;
use linkpeek_types::error::{PeekError, Result};
use serde_json::Value;

use crate::schema::{Behavior, Setting};
use crate::store::SettingsStore;

/// Typed view of a [`SettingsStore`].
///
/// ```ignore
/// let storage = LocalStorage::new(MemoryStore::new());
/// storage.set_item::<Behavior>(&TriggerMode::Drag).await?;
/// assert_eq!(storage.get_item::<Behavior>().await?, Some(TriggerMode::Drag));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalStorage<S> {
    store: S,
}

impl<S: SettingsStore> LocalStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The stored value of `K`, or `None` if it was never set.
    ///
    /// A stored value of the wrong shape is a [`PeekError::Settings`].
    pub async fn get_item<K: Setting>(&self) -> Result<Option<K::Value>> {
        let key = K::KEY.storage_key();
        match self.store.get(&key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => serde_json::from_value(raw)
                .map(Some)
                .map_err(|e| PeekError::Settings(format!("bad value for {key}: {e}"))),
        }
    }

    pub async fn set_item<K: Setting>(&self, value: &K::Value) -> Result<()> {
        let raw = serde_json::to_value(value)?;
        self.store.set(&K::KEY.storage_key(), raw).await
    }

    pub async fn remove_item<K: Setting>(&self) -> Result<()> {
        self.store.remove(&K::KEY.storage_key()).await
    }

    /// The stored value of `K`, or `default` if it was never set.
    pub async fn get_item_with_default<K: Setting>(&self, default: K::Value) -> Result<K::Value> {
        Ok(self.get_item::<K>().await?.unwrap_or(default))
    }

    /// Whether anything is stored under `K`, decodable or not.
    pub async fn has_item<K: Setting>(&self) -> Result<bool> {
        let raw = self.store.get(&K::KEY.storage_key()).await?;
        Ok(raw.is_some_and(|v| !v.is_null()))
    }
}

/// The detection config for a page: the stored behavior as the mode, and
/// the thresholds of `tuning`.
///
/// Returns `None` when no behavior is stored, or when the stored one is not
/// a known mode; the page is then left alone. Store failures are errors.
pub async fn load_detection_config<S: SettingsStore>(
    storage: &LocalStorage<S>,
    tuning: DetectionConfig,
) -> Result<Option<DetectionConfig>> {
    match storage.get_item::<Behavior>().await {
        Ok(Some(mode)) => Ok(Some(tuning.with_mode(mode))),
        Ok(None) => {
            log::debug!("no behavior stored, detection stays off");
            Ok(None)
        },
        Err(PeekError::Settings(msg)) => {
            log::warn!("ignoring stored behavior: {msg}");
            Ok(None)
        },
        Err(e) => Err(e),
    }
}
