use crate::access_list::AccessList;
use crate::config::TxConfig;
use crate::error::StateDbError;
use crate::journal::{JournalEntry, Revision};
use ethereum_types::{Address, H256, U256};
use ledgervm_common::types::{AccountInfo, Code, Log};
use ledgervm_common::utils::keccak;
use ledgervm_storage::{Keeper, StorageError};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Cached view of one account for the duration of a transaction.
#[derive(Clone, Debug, Default)]
pub(crate) struct StateAccount {
    pub info: AccountInfo,
    /// Code blob; loaded lazily on first `get_code`, set eagerly by
    /// `set_code`.
    pub code: Option<Code>,
    pub dirty_code: bool,
    /// Last committed slot values, read through to the keeper.
    pub origin_storage: FxHashMap<H256, H256>,
    /// Slot writes made during this transaction.
    pub dirty_storage: FxHashMap<H256, H256>,
    /// Whether a ledger entry exists (or was created this transaction).
    pub exists: bool,
    pub suicided: bool,
    /// Excess of `sub_balance` over the held balance. Never rejected
    /// eagerly; surfaces as an insufficient-balance error at commit, the
    /// same reconciliation point the backing ledger's burn would fail at.
    pub debt: U256,
}

/// Per-transaction journaled cache over the [`Keeper`] with
/// snapshot/revert/commit. Exclusively owned by one message application;
/// a fresh StateDB is opened per message.
pub struct StateDB {
    keeper: Keeper,
    tx_config: TxConfig,
    accounts: FxHashMap<Address, StateAccount>,
    journal: Vec<JournalEntry>,
    revisions: Vec<Revision>,
    next_revision_id: usize,
    refund: u64,
    logs: Vec<Log>,
    access_list: AccessList,
    transient: FxHashMap<(Address, H256), H256>,
}

impl StateDB {
    pub fn new(keeper: Keeper, tx_config: TxConfig) -> Self {
        Self {
            keeper,
            tx_config,
            accounts: FxHashMap::default(),
            journal: Vec::new(),
            revisions: Vec::new(),
            next_revision_id: 0,
            refund: 0,
            logs: Vec::new(),
            access_list: AccessList::default(),
            transient: FxHashMap::default(),
        }
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    pub fn tx_config(&self) -> &TxConfig {
        &self.tx_config
    }

    /// Number of journal entries accumulated so far.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    // ================== Account loading =====================

    fn load(&mut self, address: Address) -> Result<&mut StateAccount, StateDbError> {
        match self.accounts.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let account = match self.keeper.get_account(address)? {
                    Some(info) => StateAccount {
                        info,
                        exists: true,
                        ..Default::default()
                    },
                    None => StateAccount::default(),
                };
                Ok(entry.insert(account))
            }
        }
    }

    /// Loads and materializes: if the account does not exist yet it is
    /// created (journaled so a revert un-creates it).
    fn load_or_create(&mut self, address: Address) -> Result<&mut StateAccount, StateDbError> {
        let created = !self.load(address)?.exists;
        if created {
            self.journal.push(JournalEntry::Created { address });
        }
        let account = self.load(address)?;
        account.exists = true;
        Ok(account)
    }

    // ================== Account surface =====================

    pub fn exists(&mut self, address: Address) -> Result<bool, StateDbError> {
        Ok(self.load(address)?.exists)
    }

    pub fn empty(&mut self, address: Address) -> Result<bool, StateDbError> {
        let account = self.load(address)?;
        Ok(account.info.is_empty())
    }

    /// Resets nonce and code while preserving any balance already held at
    /// the address: re-creation must not destroy funds.
    pub fn create_account(&mut self, address: Address) -> Result<(), StateDbError> {
        let prev = self.load(address)?.clone();
        let balance = prev.info.balance;
        let debt = prev.debt;
        self.journal.push(JournalEntry::Reset {
            address,
            prev: Box::new(prev),
        });
        let account = self.load(address)?;
        *account = StateAccount {
            info: AccountInfo {
                balance,
                ..Default::default()
            },
            exists: true,
            debt,
            ..Default::default()
        };
        Ok(())
    }

    pub fn get_balance(&mut self, address: Address) -> Result<U256, StateDbError> {
        Ok(self.load(address)?.info.balance)
    }

    /// Adding zero is a documented no-op, even for nonexistent accounts.
    pub fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), StateDbError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.load_or_create(address)?;
        let (prev_balance, prev_debt) = (account.info.balance, account.debt);
        // Outstanding debt is paid down before the balance grows, so the
        // commit-time reconciliation sees the net amount.
        let repaid = amount.min(account.debt);
        account.debt -= repaid;
        account.info.balance = account
            .info
            .balance
            .checked_add(amount - repaid)
            .ok_or(StateDbError::BalanceOverflow)?;
        self.journal.push(JournalEntry::BalanceChange {
            address,
            prev_balance,
            prev_debt,
        });
        Ok(())
    }

    /// Subtracting zero is a documented no-op. Results below zero are not
    /// rejected here; the shortfall is carried as debt and surfaces at
    /// commit, mirroring the backing ledger's burn semantics.
    pub fn sub_balance(&mut self, address: Address, amount: U256) -> Result<(), StateDbError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.load_or_create(address)?;
        let (prev_balance, prev_debt) = (account.info.balance, account.debt);
        if amount <= account.info.balance {
            account.info.balance -= amount;
        } else {
            account.debt = account
                .debt
                .checked_add(amount - account.info.balance)
                .ok_or(StateDbError::BalanceOverflow)?;
            account.info.balance = U256::zero();
        }
        self.journal.push(JournalEntry::BalanceChange {
            address,
            prev_balance,
            prev_debt,
        });
        Ok(())
    }

    pub fn get_nonce(&mut self, address: Address) -> Result<u64, StateDbError> {
        Ok(self.load(address)?.info.nonce)
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), StateDbError> {
        let account = self.load_or_create(address)?;
        let prev = account.info.nonce;
        account.info.nonce = nonce;
        self.journal.push(JournalEntry::NonceChange { address, prev });
        Ok(())
    }

    // ================== Code =====================

    pub fn get_code_hash(&mut self, address: Address) -> Result<H256, StateDbError> {
        Ok(self.load(address)?.info.code_hash)
    }

    pub fn get_code(&mut self, address: Address) -> Result<Code, StateDbError> {
        let code_hash = {
            let account = self.load(address)?;
            if let Some(code) = &account.code {
                return Ok(code.clone());
            }
            account.info.code_hash
        };
        let code = self.keeper.get_code(code_hash)?.unwrap_or_default();
        self.load(address)?.code = Some(code.clone());
        Ok(code)
    }

    pub fn get_code_size(&mut self, address: Address) -> Result<usize, StateDbError> {
        Ok(self.get_code(address)?.len())
    }

    /// Writing code to a non-existent account is a no-op. Code is addressed
    /// by its hash and never overwritten in place.
    pub fn set_code(&mut self, address: Address, code: Code) -> Result<(), StateDbError> {
        let (prev_hash, prev_code, prev_dirty) = {
            let account = self.load(address)?;
            if !account.exists {
                return Ok(());
            }
            (
                account.info.code_hash,
                account.code.clone(),
                account.dirty_code,
            )
        };
        self.journal.push(JournalEntry::CodeChange {
            address,
            prev_hash,
            prev_code,
            prev_dirty,
        });
        let account = self.load(address)?;
        account.info.code_hash = keccak(&code);
        account.code = Some(code);
        account.dirty_code = true;
        Ok(())
    }

    // ================== Storage =====================

    pub fn get_state(&mut self, address: Address, key: H256) -> Result<H256, StateDbError> {
        if let Some(value) = self.load(address)?.dirty_storage.get(&key) {
            return Ok(*value);
        }
        self.get_committed_state(address, key)
    }

    /// Reads through the journal to the last committed value; used to
    /// compute refunds for storage-slot resets.
    pub fn get_committed_state(
        &mut self,
        address: Address,
        key: H256,
    ) -> Result<H256, StateDbError> {
        if let Some(value) = self.load(address)?.origin_storage.get(&key) {
            return Ok(*value);
        }
        let value = self.keeper.get_state(address, key)?;
        self.load(address)?.origin_storage.insert(key, value);
        Ok(value)
    }

    pub fn set_state(&mut self, address: Address, key: H256, value: H256) -> Result<(), StateDbError> {
        let prev = self.get_state(address, key)?;
        self.load_or_create(address)?;
        self.journal.push(JournalEntry::StorageChange { address, key, prev });
        self.load(address)?.dirty_storage.insert(key, value);
        Ok(())
    }

    // ================== Transient storage =====================

    pub fn get_transient_state(&self, address: Address, key: H256) -> H256 {
        self.transient
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_transient_state(&mut self, address: Address, key: H256, value: H256) {
        let prev = self.get_transient_state(address, key);
        self.journal
            .push(JournalEntry::TransientChange { address, key, prev });
        self.transient.insert((address, key), value);
    }

    // ================== Self-destruct =====================

    /// Marks the account for deletion at commit and zeroes its balance.
    /// Returns false for nonexistent accounts. Whether the account is
    /// actually a contract is only checked when the deletion runs, at
    /// commit.
    pub fn suicide(&mut self, address: Address) -> Result<bool, StateDbError> {
        let (prev_suicided, prev_balance) = {
            let account = self.load(address)?;
            if !account.exists {
                return Ok(false);
            }
            (account.suicided, account.info.balance)
        };
        self.journal.push(JournalEntry::SuicideChange {
            address,
            prev_suicided,
            prev_balance,
        });
        let account = self.load(address)?;
        account.suicided = true;
        account.info.balance = U256::zero();
        Ok(true)
    }

    pub fn has_suicided(&mut self, address: Address) -> Result<bool, StateDbError> {
        Ok(self.load(address)?.suicided)
    }

    // ================== Refund counter =====================

    pub fn refund(&self) -> u64 {
        self.refund
    }

    pub fn add_refund(&mut self, gas: u64) {
        self.journal.push(JournalEntry::RefundChange { prev: self.refund });
        self.refund = self.refund.saturating_add(gas);
    }

    /// Subtracting more than the current counter is an invariant violation
    /// a correct interpreter can never trigger; it fails fast.
    pub fn sub_refund(&mut self, gas: u64) {
        if gas > self.refund {
            panic!("refund counter below zero ({} > {})", gas, self.refund);
        }
        self.journal.push(JournalEntry::RefundChange { prev: self.refund });
        self.refund -= gas;
    }

    // ================== Logs =====================

    /// Appends a log stamped with the ambient tx context and the next
    /// block-scoped index.
    pub fn add_log(&mut self, mut log: Log) {
        log.block_hash = self.tx_config.block_hash;
        log.tx_hash = self.tx_config.tx_hash;
        log.tx_index = self.tx_config.tx_index;
        log.index = self.tx_config.log_index + self.logs.len() as u64;
        self.journal.push(JournalEntry::LogChange);
        self.logs.push(log);
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    // ================== Access list =====================

    /// Seeds the warm sets at transaction start (Berlin+): sender,
    /// recipient, the block's active precompiles and the declared access
    /// list. Setup is not journaled; a revert never cools these.
    pub fn prepare_access_list(
        &mut self,
        sender: Address,
        destination: Option<Address>,
        precompiles: &[Address],
        access_list: &[(Address, Vec<H256>)],
    ) {
        self.access_list.add_address(sender);
        if let Some(destination) = destination {
            self.access_list.add_address(destination);
        }
        for precompile in precompiles {
            self.access_list.add_address(*precompile);
        }
        for (address, keys) in access_list {
            self.access_list.add_address(*address);
            for key in keys {
                self.access_list.add_slot(*address, *key);
            }
        }
    }

    pub fn address_in_access_list(&self, address: &Address) -> bool {
        self.access_list.contains_address(address)
    }

    pub fn slot_in_access_list(&self, address: &Address, key: &H256) -> bool {
        self.access_list.contains_slot(address, key)
    }

    pub fn add_address_to_access_list(&mut self, address: Address) {
        if self.access_list.add_address(address) {
            self.journal
                .push(JournalEntry::AccessListAddAccount { address });
        }
    }

    pub fn add_slot_to_access_list(&mut self, address: Address, key: H256) {
        let (address_added, slot_added) = self.access_list.add_slot(address, key);
        if address_added {
            self.journal
                .push(JournalEntry::AccessListAddAccount { address });
        }
        if slot_added {
            self.journal
                .push(JournalEntry::AccessListAddSlot { address, key });
        }
    }

    // ================== Snapshot / revert =====================

    /// Issues the next revision id, strictly increasing from 0.
    pub fn snapshot(&mut self) -> usize {
        let id = self.next_revision_id;
        self.next_revision_id += 1;
        self.revisions.push(Revision {
            id,
            journal_len: self.journal.len(),
        });
        id
    }

    /// Truncates the journal back to the given revision, replaying undo
    /// records in reverse order. Reverting to an id not currently on the
    /// open-snapshot stack is a programmer error and fails fast.
    pub fn revert_to_snapshot(&mut self, id: usize) {
        let position = self
            .revisions
            .iter()
            .position(|revision| revision.id == id)
            .unwrap_or_else(|| panic!("revision id {id} cannot be reverted"));
        let journal_len = self.revisions[position].journal_len;
        while self.journal.len() > journal_len {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.revisions.truncate(position);
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::Created { address } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.exists = false;
                }
            }
            JournalEntry::Reset { address, prev } => {
                self.accounts.insert(address, *prev);
            }
            JournalEntry::BalanceChange {
                address,
                prev_balance,
                prev_debt,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.info.balance = prev_balance;
                    account.debt = prev_debt;
                }
            }
            JournalEntry::NonceChange { address, prev } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.info.nonce = prev;
                }
            }
            JournalEntry::StorageChange { address, key, prev } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    // The previous value may itself have been a dirty write;
                    // putting it back keeps intermediate snapshots intact.
                    account.dirty_storage.insert(key, prev);
                }
            }
            JournalEntry::CodeChange {
                address,
                prev_hash,
                prev_code,
                prev_dirty,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.info.code_hash = prev_hash;
                    account.code = prev_code;
                    account.dirty_code = prev_dirty;
                }
            }
            JournalEntry::SuicideChange {
                address,
                prev_suicided,
                prev_balance,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.suicided = prev_suicided;
                    account.info.balance = prev_balance;
                }
            }
            JournalEntry::RefundChange { prev } => {
                self.refund = prev;
            }
            JournalEntry::LogChange => {
                self.logs.pop();
            }
            JournalEntry::AccessListAddAccount { address } => {
                self.access_list.remove_address(&address);
            }
            JournalEntry::AccessListAddSlot { address, key } => {
                self.access_list.remove_slot(&address, &key);
            }
            JournalEntry::TransientChange { address, key, prev } => {
                self.transient.insert((address, key), prev);
            }
        }
    }

    // ================== Commit =====================

    /// Flushes every journaled mutation to the keeper, accounts in
    /// first-touch journal order. The first error aborts further flushing;
    /// already-flushed entries are not rolled back. On success the journal
    /// is cleared.
    pub fn commit(&mut self) -> Result<(), StateDbError> {
        let mut dirty: Vec<Address> = Vec::new();
        for entry in &self.journal {
            if let Some(address) = entry.dirtied_address() {
                if !dirty.contains(&address) {
                    dirty.push(address);
                }
            }
        }

        for address in dirty {
            let Some(account) = self.accounts.get(&address) else {
                continue;
            };
            if !account.debt.is_zero() {
                return Err(StateDbError::Storage(StorageError::InsufficientBalance {
                    address,
                    have: account.info.balance,
                    need: account.debt,
                }));
            }
            if account.suicided {
                // Non-contract self-destructs were only marked; they fail
                // here, at commit.
                self.keeper.delete_account(address)?;
                continue;
            }
            if !account.exists {
                continue;
            }
            if account.dirty_code {
                if let Some(code) = &account.code {
                    self.keeper.set_code(account.info.code_hash, code)?;
                }
            }
            self.keeper.set_account(address, account.info)?;
            // Deterministic flush order for the slot writes.
            let slots: BTreeMap<H256, H256> = account
                .dirty_storage
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect();
            for (key, value) in slots {
                self.keeper.set_state(address, key, value)?;
            }
        }

        debug!(
            entries = self.journal.len(),
            logs = self.logs.len(),
            "statedb committed"
        );
        self.journal.clear();
        self.revisions.clear();
        Ok(())
    }
}
