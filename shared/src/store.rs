use std::cell::RefCell;

use crate::error::Result;

/// Durable home of the last selected layer.
///
/// Reads never fail: a missing, corrupt or mistyped value is `None`.
pub trait SettingStore {
    fn load_layer(&self) -> Option<String>;
    fn save_layer(&self, layer_id: &str) -> Result<()>;
}

/// Non-durable store for hosts without storage access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: RefCell<Option<String>>,
    writes: RefCell<Vec<String>>,
}

impl MemoryStore {
    pub fn with_layer(layer_id: &str) -> Self {
        Self {
            value: RefCell::new(Some(layer_id.to_string())),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Every value saved so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }
}

impl SettingStore for MemoryStore {
    fn load_layer(&self) -> Option<String> {
        self.value.borrow().clone().filter(|id| !id.is_empty())
    }

    fn save_layer(&self, layer_id: &str) -> Result<()> {
        *self.value.borrow_mut() = Some(layer_id.to_string());
        self.writes.borrow_mut().push(layer_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_and_records_writes() {
        let store = MemoryStore::default();
        assert_eq!(store.load_layer(), None);
        store.save_layer("terrain").expect("memory writes succeed");
        assert_eq!(store.load_layer().as_deref(), Some("terrain"));
        assert_eq!(store.writes(), ["terrain"]);
    }

    #[test]
    fn empty_saved_layer_reads_as_absent() {
        assert_eq!(MemoryStore::with_layer("").load_layer(), None);
    }
}
