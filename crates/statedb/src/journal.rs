use ethereum_types::{Address, H256, U256};
use ledgervm_common::types::Code;

/// One undo record per mutating StateDB call. Revert replays these in
/// reverse order down to (not past) the requested revision.
#[derive(Debug)]
pub(crate) enum JournalEntry {
    /// An account entry was materialized in the cache for the first time
    /// this transaction. Undo marks it non-existent again.
    Created {
        address: Address,
    },
    /// `create_account` reset nonce and code while preserving balance.
    /// Undo restores the full previous cache entry.
    Reset {
        address: Address,
        prev: Box<crate::statedb::StateAccount>,
    },
    BalanceChange {
        address: Address,
        prev_balance: U256,
        prev_debt: U256,
    },
    NonceChange {
        address: Address,
        prev: u64,
    },
    StorageChange {
        address: Address,
        key: H256,
        prev: H256,
    },
    CodeChange {
        address: Address,
        prev_hash: H256,
        prev_code: Option<Code>,
        prev_dirty: bool,
    },
    SuicideChange {
        address: Address,
        prev_suicided: bool,
        prev_balance: U256,
    },
    RefundChange {
        prev: u64,
    },
    LogChange,
    AccessListAddAccount {
        address: Address,
    },
    AccessListAddSlot {
        address: Address,
        key: H256,
    },
    TransientChange {
        address: Address,
        key: H256,
        prev: H256,
    },
}

impl JournalEntry {
    /// Address dirtied by this record, used to flush accounts in journal
    /// (first-touch) order at commit. Refund, log and access-list records
    /// have no durable counterpart.
    pub(crate) fn dirtied_address(&self) -> Option<Address> {
        match self {
            JournalEntry::Created { address }
            | JournalEntry::Reset { address, .. }
            | JournalEntry::BalanceChange { address, .. }
            | JournalEntry::NonceChange { address, .. }
            | JournalEntry::StorageChange { address, .. }
            | JournalEntry::CodeChange { address, .. }
            | JournalEntry::SuicideChange { address, .. } => Some(*address),
            JournalEntry::RefundChange { .. }
            | JournalEntry::LogChange
            | JournalEntry::AccessListAddAccount { .. }
            | JournalEntry::AccessListAddSlot { .. }
            | JournalEntry::TransientChange { .. } => None,
        }
    }
}

/// A previously issued snapshot: its public id and the journal length at
/// the time it was taken.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Revision {
    pub id: usize,
    pub journal_len: usize,
}
