use crate::decimals::{DecimalConversion, ScaledBank};
use crate::error::StorageError;
use crate::keys::{self, CodeHashKey, CodeKey, StorageKey};
use crate::kv::KvStore;
use crate::ledger::{AccountLedger, BankLedger};
use crate::params::Params;
use crate::transient::TransientStore;
use bytes::Bytes;
use ethereum_types::{Address, Bloom, H256, U256};
use ledgervm_common::constants::EMPTY_KECCAK_HASH;
use ledgervm_common::types::{Account, AccountInfo, Code};
use ledgervm_common::utils::keccak;
use std::sync::Arc;
use tracing::debug;

/// Durable account/code/storage store; the source of truth between
/// transactions. Nonces live in the host's account ledger, balances in the
/// host's bank (rescaled through the decimal wrapper); code-hash links, code
/// blobs and contract storage live in the keeper's own prefixed store.
#[derive(Clone)]
pub struct Keeper {
    store: Arc<dyn KvStore>,
    transient: TransientStore,
    accounts: Arc<dyn AccountLedger>,
    bank: Arc<dyn BankLedger>,
    /// Canonical module account balance deltas are minted to / burned from.
    module_address: Address,
}

impl Keeper {
    pub fn new(
        store: Arc<dyn KvStore>,
        accounts: Arc<dyn AccountLedger>,
        bank: Arc<dyn BankLedger>,
        module_address: Address,
    ) -> Self {
        Self {
            store,
            transient: TransientStore::new(),
            accounts,
            bank,
            module_address,
        }
    }

    /// Fully in-memory keeper, used by tests and read-only probes.
    pub fn in_memory() -> Self {
        let ledger = Arc::new(crate::ledger::InMemoryLedger::new());
        Self::new(
            Arc::new(crate::kv::InMemoryStore::new()),
            ledger.clone(),
            ledger,
            module_address(),
        )
    }

    pub fn module_address(&self) -> Address {
        self.module_address
    }

    // ================== Params =====================

    /// Reads the params singleton, falling back to defaults when unset.
    /// Callers receive a copy; mutation goes through [`Keeper::set_params`].
    pub fn params(&self) -> Result<Params, StorageError> {
        match self.store.get(&keys::PARAMS_KEY)? {
            Some(raw) => {
                serde_json::from_slice(&raw).map_err(|e| StorageError::Decode(e.to_string()))
            }
            None => Ok(Params::default()),
        }
    }

    pub fn set_params(&self, params: Params) -> Result<(), StorageError> {
        params.validate()?;
        let raw =
            serde_json::to_vec(&params).map_err(|e| StorageError::Decode(e.to_string()))?;
        self.store.put(&keys::PARAMS_KEY, raw)
    }

    fn conversion(&self) -> Result<DecimalConversion, StorageError> {
        DecimalConversion::new(self.params()?.denom_decimals)
    }

    fn scaled_bank(&self) -> Result<ScaledBank, StorageError> {
        Ok(ScaledBank::new(self.bank.clone(), self.conversion()?))
    }

    // ================== Accounts =====================

    /// Full account lookup, `None` when the host ledger has no entry.
    pub fn get_account(&self, address: Address) -> Result<Option<AccountInfo>, StorageError> {
        let Some(account) = self.accounts.account(address)? else {
            return Ok(None);
        };
        Ok(Some(AccountInfo {
            nonce: account.sequence,
            balance: self.get_balance(address)?,
            code_hash: self.get_code_hash(address)?,
        }))
    }

    /// Like [`Keeper::get_account`] but skips the bank lookup; the returned
    /// balance is zero. For callers that only need nonce and code hash.
    pub fn get_account_without_balance(
        &self,
        address: Address,
    ) -> Result<Option<AccountInfo>, StorageError> {
        let Some(account) = self.accounts.account(address)? else {
            return Ok(None);
        };
        Ok(Some(AccountInfo {
            nonce: account.sequence,
            balance: U256::zero(),
            code_hash: self.get_code_hash(address)?,
        }))
    }

    /// Never absent: unknown addresses resolve to the canonical empty
    /// account.
    pub fn get_account_or_empty(&self, address: Address) -> Result<AccountInfo, StorageError> {
        Ok(self.get_account(address)?.unwrap_or_default())
    }

    /// Writes nonce and code hash unconditionally, then reconciles the bank
    /// balance via the delta between the requested and the current amount.
    pub fn set_account(&self, address: Address, info: AccountInfo) -> Result<(), StorageError> {
        self.accounts.ensure_account(address)?;
        self.accounts.set_sequence(address, info.nonce)?;
        if info.code_hash == EMPTY_KECCAK_HASH {
            self.store.delete(CodeHashKey::new(address).as_ref())?;
        } else {
            self.store.put(
                CodeHashKey::new(address).as_ref(),
                info.code_hash.as_bytes().to_vec(),
            )?;
        }
        self.set_balance(address, info.balance)?;
        debug!(address = %address, nonce = info.nonce, "account updated");
        Ok(())
    }

    pub fn get_nonce(&self, address: Address) -> Result<u64, StorageError> {
        Ok(self
            .accounts
            .account(address)?
            .map(|a| a.sequence)
            .unwrap_or_default())
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) -> Result<(), StorageError> {
        self.accounts.ensure_account(address)?;
        self.accounts.set_sequence(address, nonce)
    }

    /// 18-decimal balance read through the decimal wrapper.
    pub fn get_balance(&self, address: Address) -> Result<U256, StorageError> {
        self.scaled_bank()?.balance_of(address)
    }

    /// Reconciles the bank balance toward `atto`: a positive delta mints to
    /// the module account and sends it over, a negative delta sends the
    /// excess back and burns it, zero is a no-op. Any non-zero delta also
    /// materializes the ledger account entry so a funded address never
    /// resolves to an absent account.
    pub fn set_balance(&self, address: Address, atto: U256) -> Result<(), StorageError> {
        let bank = self.scaled_bank()?;
        let current = bank.balance_of(address)?;
        if atto == current {
            return Ok(());
        }
        self.accounts.ensure_account(address)?;
        if atto > current {
            let delta = atto - current;
            bank.mint_to(self.module_address, delta)?;
            bank.send(self.module_address, address, delta)
        } else {
            let delta = current - atto;
            bank.send(address, self.module_address, delta)?;
            bank.burn_from(self.module_address, delta)
        }
    }

    // ================== Code =====================

    pub fn get_code_hash(&self, address: Address) -> Result<H256, StorageError> {
        match self.store.get(CodeHashKey::new(address).as_ref())? {
            Some(raw) if raw.len() == 32 => Ok(H256::from_slice(&raw)),
            Some(raw) => Err(StorageError::Decode(format!(
                "code hash entry has {} bytes, expected 32",
                raw.len()
            ))),
            None => Ok(EMPTY_KECCAK_HASH),
        }
    }

    pub fn get_code(&self, code_hash: H256) -> Result<Option<Code>, StorageError> {
        if code_hash == EMPTY_KECCAK_HASH {
            return Ok(None);
        }
        Ok(self
            .store
            .get(CodeKey::new(code_hash).as_ref())?
            .map(Bytes::from))
    }

    pub fn get_code_by_address(&self, address: Address) -> Result<Code, StorageError> {
        Ok(self
            .get_code(self.get_code_hash(address)?)?
            .unwrap_or_default())
    }

    /// Content-addressed write: code is keyed by its hash and never
    /// overwritten in place. Empty code is not stored.
    pub fn set_code(&self, code_hash: H256, code: &Code) -> Result<(), StorageError> {
        if code_hash == EMPTY_KECCAK_HASH || code.is_empty() {
            return Ok(());
        }
        self.store
            .put(CodeKey::new(code_hash).as_ref(), code.to_vec())
    }

    /// True when `address` carries a non-empty code-hash association.
    pub fn is_contract(&self, address: Address) -> Result<bool, StorageError> {
        Ok(self.get_code_hash(address)? != EMPTY_KECCAK_HASH)
    }

    // ================== Storage =====================

    pub fn get_state(&self, address: Address, key: H256) -> Result<H256, StorageError> {
        match self.store.get(StorageKey::new(address, key).as_ref())? {
            Some(raw) if raw.len() == 32 => Ok(H256::from_slice(&raw)),
            Some(raw) => Err(StorageError::Decode(format!(
                "storage entry has {} bytes, expected 32",
                raw.len()
            ))),
            None => Ok(H256::zero()),
        }
    }

    /// A zero value is equivalent to absence and is implemented as deletion;
    /// storage must not grow with zeroed writes.
    pub fn set_state(&self, address: Address, key: H256, value: H256) -> Result<(), StorageError> {
        if value.is_zero() {
            return self.delete_state(address, key);
        }
        self.store
            .put(StorageKey::new(address, key).as_ref(), value.as_bytes().to_vec())
    }

    pub fn delete_state(&self, address: Address, key: H256) -> Result<(), StorageError> {
        self.store.delete(StorageKey::new(address, key).as_ref())
    }

    /// Direct store inspection: whether a backing entry exists for the slot,
    /// regardless of its value.
    pub fn state_entry_exists(&self, address: Address, key: H256) -> Result<bool, StorageError> {
        Ok(self
            .store
            .get(StorageKey::new(address, key).as_ref())?
            .is_some())
    }

    // ================== Self-destruct =====================

    /// Removes a contract account entirely: zeroes its balance, deletes
    /// every storage slot, drops the code-hash association (the code blob
    /// itself may be shared and stays) and removes the ledger entry.
    ///
    /// Only contracts may self-destruct; a never-seen address is a no-op
    /// success.
    pub fn delete_account(&self, address: Address) -> Result<(), StorageError> {
        let exists = self.accounts.account(address)?.is_some();
        let is_contract = self.is_contract(address)?;
        if !exists && !is_contract {
            return Ok(());
        }
        if !is_contract {
            return Err(StorageError::NotContract(address));
        }

        self.set_balance(address, U256::zero())?;

        let mut slot_keys = Vec::new();
        self.for_each_storage(address, &mut |key, _| {
            slot_keys.push(key);
            false
        })?;
        for key in slot_keys {
            self.delete_state(address, key)?;
        }

        self.store.delete(CodeHashKey::new(address).as_ref())?;
        self.accounts.remove_account(address)?;
        debug!(address = %address, "contract account deleted");
        Ok(())
    }

    // ================== Iteration =====================

    /// Visits every contract address together with its code hash, in
    /// ascending address order. The callback returns `true` to stop.
    pub fn iterate_contracts(
        &self,
        f: &mut dyn FnMut(Address, H256) -> bool,
    ) -> Result<(), StorageError> {
        self.store.iter_prefix(&[keys::CODE_HASH_PREFIX], &mut |key, value| {
            if key.len() != 21 || value.len() != 32 {
                return false;
            }
            let address = Address::from_slice(&key[1..]);
            f(address, H256::from_slice(value))
        })
    }

    /// Visits every storage slot of `address` in ascending key order. The
    /// callback returns `true` to stop.
    pub fn for_each_storage(
        &self,
        address: Address,
        f: &mut dyn FnMut(H256, H256) -> bool,
    ) -> Result<(), StorageError> {
        let prefix = keys::storage_prefix(address);
        self.store.iter_prefix(&prefix, &mut |key, value| {
            if key.len() != 53 || value.len() != 32 {
                return false;
            }
            f(H256::from_slice(&key[21..]), H256::from_slice(value))
        })
    }

    // ================== Transient (per-block) =====================

    pub fn block_bloom(&self, height: u64) -> Result<Bloom, StorageError> {
        self.transient.block_bloom(height)
    }

    pub fn accrue_block_bloom(&self, height: u64, bloom: Bloom) -> Result<(), StorageError> {
        self.transient.accrue_block_bloom(height, bloom)
    }

    pub fn tx_index(&self) -> Result<u64, StorageError> {
        self.transient.tx_index()
    }

    pub fn increment_tx_index(&self) -> Result<(), StorageError> {
        self.transient.increment_tx_index()
    }

    pub fn log_size(&self) -> Result<u64, StorageError> {
        self.transient.log_size()
    }

    pub fn add_log_size(&self, count: u64) -> Result<(), StorageError> {
        self.transient.add_log_size(count)
    }

    pub fn gas_used(&self) -> Result<u64, StorageError> {
        self.transient.gas_used()
    }

    pub fn add_gas_used(&self, gas: u64) -> Result<(), StorageError> {
        self.transient.add_gas_used(gas)
    }

    /// Clears the per-block counters at the block boundary.
    pub fn clear_transient(&self) -> Result<(), StorageError> {
        self.transient.clear()
    }

    // ================== Seeding / probes =====================

    /// Genesis-style helper: installs code, storage and account info in one
    /// call.
    pub fn seed_account(&self, address: Address, account: &Account) -> Result<(), StorageError> {
        self.set_code(account.info.code_hash, &account.code)?;
        self.set_account(address, account.info)?;
        for (key, value) in &account.storage {
            self.set_state(address, *key, *value)?;
        }
        Ok(())
    }

    /// Deep copy of the entire keeper, backed by independent storage and
    /// ledgers. Used for discard-only probes and trace pre-state
    /// reconstruction.
    pub fn isolated_copy(&self) -> Keeper {
        Keeper {
            store: self.store.isolated_copy(),
            transient: self.transient.isolated_copy(),
            accounts: self.accounts.isolated_copy(),
            bank: self.bank.isolated_copy(),
            module_address: self.module_address,
        }
    }
}

/// Canonical module account address, derived from the module name.
pub fn module_address() -> Address {
    Address::from_slice(&keccak(b"ledgervm-module").as_bytes()[12..])
}
