use crate::error::StorageError;
use ethereum_types::{Address, U256};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

/// The host ledger's view of one account: just the sequence number. Balance
/// lives with the bank side, code and storage with the keeper's own store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerAccount {
    pub sequence: u64,
}

/// Account-sequence collaborator: lookup and update of the host ledger's
/// account entries.
pub trait AccountLedger: Send + Sync {
    fn account(&self, address: Address) -> Result<Option<LedgerAccount>, StorageError>;

    /// Creates the account entry if it does not exist yet.
    fn ensure_account(&self, address: Address) -> Result<(), StorageError>;

    fn set_sequence(&self, address: Address, sequence: u64) -> Result<(), StorageError>;

    fn remove_account(&self, address: Address) -> Result<(), StorageError>;

    fn isolated_copy(&self) -> Arc<dyn AccountLedger>;
}

/// Mint/burn/send collaborator over the host ledger's coin abstraction.
/// Amounts are in the host's native denomination; the decimal wrappers
/// rescale before calling in here.
pub trait BankLedger: Send + Sync {
    fn balance_of(&self, address: Address) -> Result<U256, StorageError>;

    fn mint_to(&self, address: Address, amount: U256) -> Result<(), StorageError>;

    fn burn_from(&self, address: Address, amount: U256) -> Result<(), StorageError>;

    fn send(&self, from: Address, to: Address, amount: U256) -> Result<(), StorageError>;

    fn isolated_copy(&self) -> Arc<dyn BankLedger>;
}

/// In-memory account + bank ledger, used by tests and standalone setups.
#[derive(Default, Clone)]
pub struct InMemoryLedger(Arc<Mutex<LedgerInner>>);

#[derive(Default, Clone)]
struct LedgerInner {
    accounts: FxHashMap<Address, LedgerAccount>,
    balances: FxHashMap<Address, U256>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: credits `address` directly, bypassing the mint path.
    pub fn set_balance(&self, address: Address, amount: U256) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.balances.insert(address, amount);
        Ok(())
    }
}

impl AccountLedger for InMemoryLedger {
    fn account(&self, address: Address) -> Result<Option<LedgerAccount>, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.accounts.get(&address).copied())
    }

    fn ensure_account(&self, address: Address) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.accounts.entry(address).or_default();
        Ok(())
    }

    fn set_sequence(&self, address: Address, sequence: u64) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.accounts.entry(address).or_default().sequence = sequence;
        Ok(())
    }

    fn remove_account(&self, address: Address) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        inner.accounts.remove(&address);
        Ok(())
    }

    fn isolated_copy(&self) -> Arc<dyn AccountLedger> {
        Arc::new(self.deep_clone())
    }
}

impl BankLedger for InMemoryLedger {
    fn balance_of(&self, address: Address) -> Result<U256, StorageError> {
        let inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        Ok(inner.balances.get(&address).copied().unwrap_or_default())
    }

    fn mint_to(&self, address: Address, amount: U256) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        let balance = inner.balances.entry(address).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(StorageError::AmountOverflow)?;
        Ok(())
    }

    fn burn_from(&self, address: Address, amount: U256) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        let balance = inner.balances.entry(address).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or(StorageError::InsufficientBalance {
                address,
                have: *balance,
                need: amount,
            })?;
        Ok(())
    }

    fn send(&self, from: Address, to: Address, amount: U256) -> Result<(), StorageError> {
        let mut inner = self.0.lock().map_err(|_| StorageError::LockError)?;
        let from_balance = inner.balances.get(&from).copied().unwrap_or_default();
        let remaining =
            from_balance
                .checked_sub(amount)
                .ok_or(StorageError::InsufficientBalance {
                    address: from,
                    have: from_balance,
                    need: amount,
                })?;
        inner.balances.insert(from, remaining);
        let to_balance = inner.balances.entry(to).or_default();
        *to_balance = to_balance
            .checked_add(amount)
            .ok_or(StorageError::AmountOverflow)?;
        Ok(())
    }

    fn isolated_copy(&self) -> Arc<dyn BankLedger> {
        Arc::new(self.deep_clone())
    }
}

impl InMemoryLedger {
    fn deep_clone(&self) -> InMemoryLedger {
        let inner = self
            .0
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        InMemoryLedger(Arc::new(Mutex::new(inner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_moves_funds_and_rejects_overdraft() {
        let ledger = InMemoryLedger::new();
        let alice = Address::repeat_byte(0x01);
        let bob = Address::repeat_byte(0x02);
        ledger.mint_to(alice, U256::from(100)).expect("mint");

        ledger.send(alice, bob, U256::from(40)).expect("send");
        assert_eq!(ledger.balance_of(alice).expect("balance"), U256::from(60));
        assert_eq!(ledger.balance_of(bob).expect("balance"), U256::from(40));

        let err = ledger.send(alice, bob, U256::from(61)).expect_err("overdraft");
        assert!(matches!(err, StorageError::InsufficientBalance { .. }));
    }

    #[test]
    fn burn_more_than_held_is_an_error() {
        let ledger = InMemoryLedger::new();
        let addr = Address::repeat_byte(0x03);
        ledger.mint_to(addr, U256::from(5)).expect("mint");
        assert!(ledger.burn_from(addr, U256::from(6)).is_err());
        assert_eq!(ledger.balance_of(addr).expect("balance"), U256::from(5));
    }
}
