//! Stack-allocated composite keys partitioning the single keyed store.
//!
//! Fixed single-byte prefixes keep the key space disjoint:
//! `0x01` params singleton, `0x02 ‖ addr` code-hash association,
//! `0x03 ‖ hash` code blob, `0x04 ‖ addr ‖ key` contract storage.

use ethereum_types::{Address, H256};

pub const PARAMS_KEY: [u8; 1] = [0x01];
pub const CODE_HASH_PREFIX: u8 = 0x02;
pub const CODE_PREFIX: u8 = 0x03;
pub const STORAGE_PREFIX: u8 = 0x04;

/// 21-byte key for an account's code-hash association: prefix + address.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct CodeHashKey([u8; 21]);

impl CodeHashKey {
    #[inline]
    pub fn new(address: Address) -> Self {
        let mut key = [0u8; 21];
        key[0] = CODE_HASH_PREFIX;
        key[1..].copy_from_slice(address.as_bytes());
        Self(key)
    }
}

impl AsRef<[u8]> for CodeHashKey {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 33-byte key for a content-addressed code blob: prefix + keccak hash.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct CodeKey([u8; 33]);

impl CodeKey {
    #[inline]
    pub fn new(code_hash: H256) -> Self {
        let mut key = [0u8; 33];
        key[0] = CODE_PREFIX;
        key[1..].copy_from_slice(code_hash.as_bytes());
        Self(key)
    }
}

impl AsRef<[u8]> for CodeKey {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 53-byte key for one storage slot: prefix + address + slot key.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct StorageKey([u8; 53]);

impl StorageKey {
    #[inline]
    pub fn new(address: Address, key: H256) -> Self {
        let mut buf = [0u8; 53];
        buf[0] = STORAGE_PREFIX;
        buf[1..21].copy_from_slice(address.as_bytes());
        buf[21..].copy_from_slice(key.as_bytes());
        Self(buf)
    }
}

impl AsRef<[u8]> for StorageKey {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 21-byte iteration prefix covering every storage slot of one contract.
#[inline]
pub fn storage_prefix(address: Address) -> [u8; 21] {
    let mut prefix = [0u8; 21];
    prefix[0] = STORAGE_PREFIX;
    prefix[1..].copy_from_slice(address.as_bytes());
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_share_the_contract_prefix() {
        let address = Address::repeat_byte(0x11);
        let key = StorageKey::new(address, H256::repeat_byte(0x22));
        assert!(key.as_ref().starts_with(&storage_prefix(address)));
    }

    #[test]
    fn prefixes_are_disjoint() {
        let address = Address::zero();
        let hash = H256::zero();
        assert_ne!(CodeHashKey::new(address).as_ref()[0], CodeKey::new(hash).as_ref()[0]);
        assert_ne!(CodeKey::new(hash).as_ref()[0], StorageKey::new(address, hash).as_ref()[0]);
    }
}
