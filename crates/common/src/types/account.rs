use crate::constants::EMPTY_KECCAK_HASH;
use crate::utils::keccak;
use bytes::Bytes;
use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Code = Bytes;

/// Nonce + balance + code-hash triple keyed by address.
///
/// Balances are 18-decimal fixed point regardless of the host ledger's
/// configured denomination; the storage keeper rescales on the way in and
/// out. A non-existent address resolves to [`AccountInfo::default`], never
/// to an absent value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: H256,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            code_hash: EMPTY_KECCAK_HASH,
        }
    }
}

impl AccountInfo {
    pub fn new(nonce: u64, balance: U256, code_hash: H256) -> Self {
        Self {
            nonce,
            balance,
            code_hash,
        }
    }

    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_KECCAK_HASH
    }

    pub fn has_nonce(&self) -> bool {
        self.nonce != 0
    }

    /// Empty per the canonical empty-account rule: zero nonce, zero balance
    /// and the empty-code hash.
    pub fn is_empty(&self) -> bool {
        !self.has_nonce() && self.balance.is_zero() && !self.has_code()
    }
}

/// Fully materialized account, used for genesis-style seeding and tests.
/// Regular execution paths work with [`AccountInfo`] and fetch code lazily
/// through its hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub info: AccountInfo,
    pub code: Code,
    pub storage: BTreeMap<H256, H256>,
}

impl Account {
    pub fn new(balance: U256, code: Code, nonce: u64, storage: BTreeMap<H256, H256>) -> Self {
        Self {
            info: AccountInfo {
                nonce,
                balance,
                code_hash: keccak(&code),
            },
            code,
            storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_is_empty_with_empty_code_hash() {
        let info = AccountInfo::default();
        assert!(info.is_empty());
        assert_eq!(info.code_hash, EMPTY_KECCAK_HASH);
        assert!(!info.has_code());
    }

    #[test]
    fn account_new_hashes_code() {
        let account = Account::new(
            U256::from(10),
            Bytes::from_static(&[0x60, 0x00]),
            0,
            BTreeMap::new(),
        );
        assert_eq!(account.info.code_hash, keccak([0x60, 0x00]));
        assert!(account.info.has_code());
    }
}
