use crate::config::EvmConfig;
use crate::errors::ExecutionError;
use crate::message::Message;
use crate::policy::PermissionPolicy;
use crate::precompiles::ActivePrecompiles;
use crate::tracer::Tracer;
use bytes::Bytes;
use ethereum_types::Address;
use ledgervm_statedb::StateDB;

/// Everything the bytecode interpreter sees while running one message. The
/// interpreter mutates state exclusively through the StateDB and consults
/// the policy before CREATE/CALL opcodes. The tracer outlives the borrowed
/// execution state and carries its own lifetime.
pub struct VmContext<'a, 't> {
    pub statedb: &'a mut StateDB,
    pub config: &'a EvmConfig,
    pub precompiles: &'a ActivePrecompiles,
    pub policy: &'a PermissionPolicy,
    pub tracer: Option<&'t mut dyn Tracer>,
}

/// What the interpreter hands back. A VM-level failure (revert, out of gas,
/// invalid opcode) is data in `vm_error`, not an `Err`: gas is still
/// charged and the surrounding transaction proceeds.
#[derive(Clone, Debug, Default)]
pub struct VmOutcome {
    pub output: Bytes,
    pub gas_left: u64,
    pub vm_error: Option<String>,
    /// Address of the deployed contract, for creations that succeeded.
    pub created_contract: Option<Address>,
}

/// Externally supplied bytecode interpreter. Opcode semantics live behind
/// this seam; the executor only drives it and settles gas afterwards.
/// `gas` is what remains of the message's limit after intrinsic gas.
pub trait Interpreter {
    fn create(
        &self,
        ctx: &mut VmContext<'_, '_>,
        msg: &Message,
        gas: u64,
    ) -> Result<VmOutcome, ExecutionError>;

    fn call(
        &self,
        ctx: &mut VmContext<'_, '_>,
        msg: &Message,
        gas: u64,
    ) -> Result<VmOutcome, ExecutionError>;
}
