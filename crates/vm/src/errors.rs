use ethereum_types::Address;
use ledgervm_statedb::StateDbError;
use ledgervm_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the state transition executor.
///
/// Three tiers apply: admission-time failures (create/call disabled,
/// intrinsic gas) reject before any VM work; VM execution failures are
/// *data* and travel inside [`crate::ExecutionResult::vm_error`], never
/// through this enum; everything else here is a hard failure of the
/// enclosing transaction.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("contract creation is disabled by chain params")]
    CreateDisabled,
    #[error("contract calls are disabled by chain params")]
    CallDisabled,
    #[error("intrinsic gas too low: have {have}, want {want}")]
    IntrinsicGas { have: u64, want: u64 },
    #[error("gas counter overflow")]
    GasOverflow,
    #[error("signer {signer:#x} and caller {caller:#x} are not authorized to deploy contracts")]
    CreateNotAuthorized { signer: Address, caller: Address },
    #[error("signer {signer:#x} and caller {caller:#x} are not authorized to perform a call")]
    CallNotAuthorized { signer: Address, caller: Address },
    #[error("gas estimation failed at the gas cap: {0}")]
    GasEstimationFailed(String),
    #[error(transparent)]
    Precompile(#[from] PrecompileError),
    #[error(transparent)]
    StateDb(#[from] StateDbError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error)]
pub enum PrecompileError {
    /// Reserved-but-inactive address: registered, but missing from the
    /// block's active set. Distinct from plain-account-call semantics so a
    /// deactivated precompile can never behave like an externally owned
    /// account.
    #[error("precompile {0:#x} is registered but not active for this block")]
    Inactive(Address),
    #[error("precompile {0:#x} is already registered")]
    AlreadyRegistered(Address),
    #[error("precompile {0:#x}: out of gas")]
    OutOfGas(Address),
    #[error("{0}")]
    Custom(String),
}
