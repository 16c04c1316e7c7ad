use crate::config::EvmConfig;
use crate::errors::ExecutionError;
use crate::gas::{gas_to_refund, intrinsic_gas};
use crate::interpreter::{Interpreter, VmContext, VmOutcome};
use crate::message::Message;
use crate::policy::PermissionPolicy;
use crate::precompiles::PrecompileRegistry;
use crate::tracer::Tracer;
use bytes::Bytes;
use ethereum_types::{Address, H256};
use ledgervm_common::types::{Log, bloom_from_logs};
use ledgervm_statedb::{StateDB, TxConfig};
use ledgervm_storage::Keeper;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Outcome of applying one message. A VM-level failure is carried in
/// `vm_error`; gas is charged either way and the result is still `Ok`.
#[derive(Clone, Debug, Default)]
pub struct ExecutionResult {
    pub output: Bytes,
    pub gas_used: u64,
    pub vm_error: Option<String>,
    pub logs: Vec<Log>,
    pub created_contract: Option<Address>,
}

impl ExecutionResult {
    pub fn failed(&self) -> bool {
        self.vm_error.is_some()
    }
}

/// Applies messages against the keeper: gates them by params, reserves
/// intrinsic gas, drives the interpreter, settles refunds and the billing
/// floor, and commits or discards the resulting state.
pub struct Executor {
    keeper: Keeper,
    registry: Arc<PrecompileRegistry>,
    interpreter: Arc<dyn Interpreter>,
}

impl Executor {
    pub fn new(
        keeper: Keeper,
        registry: Arc<PrecompileRegistry>,
        interpreter: Arc<dyn Interpreter>,
    ) -> Self {
        Self {
            keeper,
            registry,
            interpreter,
        }
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    /// Same registry and interpreter over a deep copy of the keeper. Probes
    /// and traces run here so nothing leaks into the ambient state.
    pub fn isolated(&self) -> Executor {
        Executor {
            keeper: self.keeper.isolated_copy(),
            registry: self.registry.clone(),
            interpreter: self.interpreter.clone(),
        }
    }

    /// TxConfig for the next message in the current block, drawing the tx
    /// index and starting log index from the transient counters.
    pub fn next_tx_config(
        &self,
        block_hash: H256,
        tx_hash: H256,
    ) -> Result<TxConfig, ExecutionError> {
        Ok(TxConfig::new(
            block_hash,
            tx_hash,
            self.keeper.tx_index()?,
            self.keeper.log_size()?,
        ))
    }

    /// Applies one message. `commit` decides whether the journaled state is
    /// flushed to the keeper or discarded; read-only probes pass `false`.
    #[instrument(skip_all, fields(from = %msg.from, create = msg.is_create(), gas_limit = msg.gas_limit))]
    pub fn apply_message(
        &self,
        msg: &Message,
        config: &EvmConfig,
        tx_config: TxConfig,
        commit: bool,
        tracer: Option<&mut dyn Tracer>,
    ) -> Result<ExecutionResult, ExecutionError> {
        // Gate by params before any state is touched.
        if msg.is_create() && !config.params.enable_create {
            return Err(ExecutionError::CreateDisabled);
        }
        if !msg.is_create() && !config.params.enable_call {
            return Err(ExecutionError::CallDisabled);
        }

        let mut statedb = StateDB::new(self.keeper.clone(), tx_config);
        let precompiles = self.registry.active(
            &config.params.active_static_precompiles,
            &config.params.active_dynamic_precompiles,
        );
        let policy = PermissionPolicy::new(&config.params.access_control, msg.from);

        // Admission re-checks intrinsic gas: query paths bypass the outer
        // admission check entirely.
        let intrinsic = intrinsic_gas(msg, &config.rules)?;
        if msg.gas_limit < intrinsic {
            return Err(ExecutionError::IntrinsicGas {
                have: msg.gas_limit,
                want: intrinsic,
            });
        }
        let available_gas = msg.gas_limit - intrinsic;

        if config.rules.is_berlin {
            statedb.prepare_access_list(
                msg.from,
                msg.recipient(),
                &precompiles.addresses(),
                &msg.access_list,
            );
        }

        let outcome = {
            let mut ctx = VmContext {
                statedb: &mut statedb,
                config,
                precompiles: &precompiles,
                policy: &policy,
                tracer,
            };
            if msg.is_create() {
                policy.check_create(msg.from)?;
                // Nonce consumption is not reverted by VM-level failure: set
                // it before the create, bump it unconditionally after.
                ctx.statedb.set_nonce(msg.from, msg.nonce)?;
                let outcome = self.interpreter.create(&mut ctx, msg, available_gas)?;
                ctx.statedb.set_nonce(msg.from, msg.nonce + 1)?;
                outcome
            } else {
                policy.check_call(msg.from, msg.recipient().unwrap_or_default())?;
                ctx.statedb.set_nonce(msg.from, msg.nonce + 1)?;
                self.interpreter.call(&mut ctx, msg, available_gas)?
            }
        };

        let gas_used = self.settle_gas(msg, config, &statedb, &outcome)?;

        let logs = statedb.logs().to_vec();
        if commit {
            statedb.commit()?;
            self.keeper.add_gas_used(gas_used)?;
            self.keeper.increment_tx_index()?;
            if !logs.is_empty() {
                self.keeper
                    .accrue_block_bloom(config.block_number, bloom_from_logs(&logs))?;
                self.keeper.add_log_size(logs.len() as u64)?;
            }
        }

        debug!(
            gas_used,
            vm_error = outcome.vm_error.as_deref().unwrap_or("none"),
            committed = commit,
            "message applied"
        );
        Ok(ExecutionResult {
            output: outcome.output,
            gas_used,
            vm_error: outcome.vm_error,
            logs,
            created_contract: outcome.created_contract,
        })
    }

    /// Refund-adjusted gas used, floored at the minimum billable share of
    /// the declared limit. Leftover gas above the limit means the
    /// interpreter miscounted; that is fatal, not billable.
    fn settle_gas(
        &self,
        msg: &Message,
        config: &EvmConfig,
        statedb: &StateDB,
        outcome: &VmOutcome,
    ) -> Result<u64, ExecutionError> {
        if outcome.gas_left > msg.gas_limit {
            return Err(ExecutionError::GasOverflow);
        }
        let used = msg.gas_limit - outcome.gas_left;
        let refund = gas_to_refund(statedb.refund(), used, config.rules.is_london);
        let refunded = used.checked_sub(refund).ok_or(ExecutionError::GasOverflow)?;
        let floor = config.min_gas_multiplier.floor(msg.gas_limit)?;
        Ok(refunded.max(floor))
    }
}
