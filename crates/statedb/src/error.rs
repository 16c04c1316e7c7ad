use ledgervm_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateDbError {
    #[error("balance overflows 256 bits")]
    BalanceOverflow,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
