use crate::error::StorageError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Minimal keyed-store surface the keeper writes through. Keys are iterated
/// in ascending byte order so enumeration is deterministic across nodes.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), StorageError>;

    fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Visits every `(key, value)` under `prefix` in ascending key order.
    /// The callback returns `true` to stop iteration early.
    fn iter_prefix(
        &self,
        prefix: &[u8],
        f: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), StorageError>;

    /// Deep copy backed by independent storage, for discard-only probes and
    /// trace pre-state reconstruction.
    fn isolated_copy(&self) -> Arc<dyn KvStore>;
}

/// In-memory store over an ordered map.
#[derive(Default, Clone)]
pub struct InMemoryStore(Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.remove(key);
        Ok(())
    }

    fn iter_prefix(
        &self,
        prefix: &[u8],
        f: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        for (key, value) in inner.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            if f(key, value) {
                break;
            }
        }
        Ok(())
    }

    fn isolated_copy(&self) -> Arc<dyn KvStore> {
        let inner = self
            .0
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        Arc::new(InMemoryStore(Arc::new(Mutex::new(inner))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_prefix_stays_within_prefix_and_supports_early_exit() {
        let store = InMemoryStore::new();
        store.put(&[0x01, 0x01], vec![1]).expect("put");
        store.put(&[0x01, 0x02], vec![2]).expect("put");
        store.put(&[0x02, 0x01], vec![3]).expect("put");

        let mut seen = Vec::new();
        store
            .iter_prefix(&[0x01], &mut |key, _| {
                seen.push(key.to_vec());
                false
            })
            .expect("iterate");
        assert_eq!(seen, vec![vec![0x01, 0x01], vec![0x01, 0x02]]);

        let mut count = 0;
        store
            .iter_prefix(&[0x01], &mut |_, _| {
                count += 1;
                true
            })
            .expect("iterate");
        assert_eq!(count, 1);
    }

    #[test]
    fn isolated_copy_does_not_observe_later_writes() {
        let store = InMemoryStore::new();
        store.put(b"a", vec![1]).expect("put");
        let copy = store.isolated_copy();
        store.put(b"b", vec![2]).expect("put");
        assert_eq!(copy.get(b"a").expect("get"), Some(vec![1]));
        assert_eq!(copy.get(b"b").expect("get"), None);
    }
}
