use crate::error::StorageError;
use ethereum_types::Bloom;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Per-block scratch counters: the running block bloom keyed by height, the
/// next transaction index, the block-scoped log counter and cumulative gas.
/// Everything here is cleared when the block is sealed.
#[derive(Default, Clone)]
pub struct TransientStore(Arc<Mutex<TransientInner>>);

#[derive(Default, Debug, Clone)]
struct TransientInner {
    block_bloom: BTreeMap<u64, Bloom>,
    tx_index: u64,
    log_size: u64,
    gas_used: u64,
}

impl TransientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_bloom(&self, height: u64) -> Result<Bloom, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.block_bloom.get(&height).copied().unwrap_or_default())
    }

    /// ORs `bloom` into the accumulator for `height`.
    pub fn accrue_block_bloom(&self, height: u64, bloom: Bloom) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        let entry = inner.block_bloom.entry(height).or_default();
        entry.accrue_bloom(&bloom);
        Ok(())
    }

    pub fn tx_index(&self) -> Result<u64, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.tx_index)
    }

    pub fn increment_tx_index(&self) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.tx_index = inner.tx_index.saturating_add(1);
        Ok(())
    }

    pub fn log_size(&self) -> Result<u64, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.log_size)
    }

    pub fn add_log_size(&self, count: u64) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.log_size = inner.log_size.saturating_add(count);
        Ok(())
    }

    pub fn gas_used(&self) -> Result<u64, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.gas_used)
    }

    pub fn add_gas_used(&self, gas: u64) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.gas_used = inner.gas_used.saturating_add(gas);
        Ok(())
    }

    /// Resets every counter. Called once per block boundary.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        *inner = TransientInner::default();
        Ok(())
    }

    pub fn isolated_copy(&self) -> TransientStore {
        let inner = self
            .0
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        TransientStore(Arc::new(Mutex::new(inner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_reset_on_clear() {
        let transient = TransientStore::new();
        transient.increment_tx_index().expect("tx index");
        transient.add_log_size(3).expect("log size");
        transient.add_gas_used(21000).expect("gas");
        transient
            .accrue_block_bloom(7, Bloom::repeat_byte(0x01))
            .expect("bloom");

        transient.clear().expect("clear");
        assert_eq!(transient.tx_index().expect("tx index"), 0);
        assert_eq!(transient.log_size().expect("log size"), 0);
        assert_eq!(transient.gas_used().expect("gas"), 0);
        assert_eq!(transient.block_bloom(7).expect("bloom"), Bloom::zero());
    }

    #[test]
    fn bloom_accumulates_per_height() {
        let transient = TransientStore::new();
        let mut first = Bloom::zero();
        first.0[0] = 0x01;
        let mut second = Bloom::zero();
        second.0[0] = 0x02;
        transient.accrue_block_bloom(1, first).expect("accrue");
        transient.accrue_block_bloom(1, second).expect("accrue");
        assert_eq!(transient.block_bloom(1).expect("bloom").0[0], 0x03);
        assert_eq!(transient.block_bloom(2).expect("bloom"), Bloom::zero());
    }
}
