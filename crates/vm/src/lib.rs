mod config;
mod errors;
mod executor;
mod gas;
mod interpreter;
mod message;
mod policy;
mod precompiles;
mod queries;
mod tracer;

pub use config::EvmConfig;
pub use errors::{ExecutionError, PrecompileError};
pub use executor::{ExecutionResult, Executor};
pub use gas::{
    MinGasMultiplier, REFUND_QUOTIENT, REFUND_QUOTIENT_EIP3529, TX_ACCESS_LIST_ADDRESS_GAS,
    TX_ACCESS_LIST_STORAGE_KEY_GAS, TX_DATA_NON_ZERO_GAS_EIP2028, TX_DATA_NON_ZERO_GAS_FRONTIER,
    TX_DATA_ZERO_GAS, TX_GAS, TX_GAS_CONTRACT_CREATION, gas_to_refund, intrinsic_gas,
    refund_quotient,
};
pub use interpreter::{Interpreter, VmContext, VmOutcome};
pub use message::{Message, TxKind};
pub use policy::PermissionPolicy;
pub use precompiles::{
    ActivePrecompiles, DynamicPrecompileFactory, PrecompileRegistry, PrecompileRegistryBuilder,
    PrecompiledContract,
};
pub use queries::DEFAULT_GAS_CAP;
pub use tracer::{CancelToken, StructTracer, TraceStep, Tracer};
