use std::rc::Rc;

use gloo_storage::{LocalStorage, Storage};
use map_switcher_shared::error::Result;
use map_switcher_shared::{MemoryStore, SettingStore, SwitcherError};

/// Layer choice persisted as a JSON string in `localStorage`.
pub struct LocalLayerStore {
    key: String,
}

impl SettingStore for LocalLayerStore {
    fn load_layer(&self) -> Option<String> {
        // Corrupt JSON or a non-string value reads as "nothing saved".
        LocalStorage::get::<String>(&self.key)
            .ok()
            .filter(|layer| !layer.is_empty())
    }

    fn save_layer(&self, layer_id: &str) -> Result<()> {
        LocalStorage::set(&self.key, layer_id).map_err(|e| SwitcherError::Storage(e.to_string()))
    }
}

fn local_storage_available() -> bool {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .is_some()
}

/// `localStorage` when the page may use it, otherwise an in-memory store so
/// layer switching keeps working for the session.
pub fn layer_store(key: &str) -> Rc<dyn SettingStore> {
    if local_storage_available() {
        Rc::new(LocalLayerStore {
            key: key.to_string(),
        })
    } else {
        tracing::warn!("localStorage unavailable, layer choice will not persist");
        Rc::new(MemoryStore::default())
    }
}
