use ethereum_types::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to lock store for access")]
    LockError,
    #[error("failed to decode stored value: {0}")]
    Decode(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("unsupported denomination precision: {0} decimals")]
    InvalidDecimals(u8),
    #[error("balance does not fit in 256 bits after rescaling")]
    AmountOverflow,
    #[error("account {0:#x} is not a contract: only smart contracts can be self-destructed")]
    NotContract(Address),
    #[error("insufficient balance of {address:#x}: have {have}, need {need}")]
    InsufficientBalance {
        address: Address,
        have: U256,
        need: U256,
    },
    #[error("{0}")]
    Custom(String),
}
