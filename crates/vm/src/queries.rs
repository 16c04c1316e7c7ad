use crate::config::EvmConfig;
use crate::errors::ExecutionError;
use crate::executor::{ExecutionResult, Executor};
use crate::gas::intrinsic_gas;
use crate::message::Message;
use crate::tracer::{CancelToken, StructTracer};
use ethereum_types::H256;
use std::time::Duration;
use tracing::debug;

/// Upper bound for gas estimation probes when the caller declares no limit.
pub const DEFAULT_GAS_CAP: u64 = 25_000_000;

/// Read-only entry points. Every probe runs against an isolated copy of
/// the keeper and is discarded; durable state is never touched.
impl Executor {
    /// Executes against current state and discards the result's mutations.
    pub fn eth_call(
        &self,
        msg: &Message,
        config: &EvmConfig,
    ) -> Result<ExecutionResult, ExecutionError> {
        let probe = self.isolated();
        let tx_config = probe.next_tx_config(config.block_hash, H256::zero())?;
        probe.apply_message(msg, config, tx_config, false, None)
    }

    /// Binary search for the smallest gas limit the message succeeds with,
    /// in `[intrinsic − 1, min(declared, block limit, gas_cap)]`. Each probe
    /// is isolated. If the message still fails at the upper bound, the VM
    /// error payload is surfaced as the estimation failure.
    pub fn estimate_gas(
        &self,
        msg: &Message,
        config: &EvmConfig,
        gas_cap: u64,
    ) -> Result<u64, ExecutionError> {
        let intrinsic = intrinsic_gas(msg, &config.rules)?;
        let mut lo = intrinsic.saturating_sub(1);
        let mut hi = config.block_gas_limit.min(gas_cap);
        if msg.gas_limit >= intrinsic {
            hi = hi.min(msg.gas_limit);
        }
        if hi <= lo {
            return Err(ExecutionError::GasEstimationFailed(format!(
                "gas cap {hi} does not cover intrinsic gas {intrinsic}"
            )));
        }

        if let Some(vm_error) = self.probe(msg, config, hi)? {
            return Err(ExecutionError::GasEstimationFailed(vm_error));
        }
        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2;
            if self.probe(msg, config, mid)?.is_some() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        debug!(estimate = hi, intrinsic, "gas estimated");
        Ok(hi)
    }

    /// One estimation probe at `gas_limit`. A failed probe is `Some(reason)`:
    /// either the VM error payload or an intrinsic-gas rejection; hard
    /// errors propagate.
    fn probe(
        &self,
        msg: &Message,
        config: &EvmConfig,
        gas_limit: u64,
    ) -> Result<Option<String>, ExecutionError> {
        let mut probe_msg = msg.clone();
        probe_msg.gas_limit = gas_limit;
        let probe = self.isolated();
        let tx_config = probe.next_tx_config(config.block_hash, H256::zero())?;
        match probe.apply_message(&probe_msg, config, tx_config, false, None) {
            Ok(result) => Ok(result.vm_error),
            Err(err @ ExecutionError::IntrinsicGas { .. }) => Ok(Some(err.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Traces one transaction of a block: reconstructs the exact pre-state
    /// by re-applying every predecessor in order against an isolated copy,
    /// then runs the target uncommitted with a structured tracer. The
    /// optional timeout installs a cooperative deadline; expiry truncates
    /// the trace, it never interrupts execution mid-step.
    pub fn trace_tx(
        &self,
        predecessors: &[Message],
        target: &Message,
        config: &EvmConfig,
        timeout: Option<Duration>,
    ) -> Result<(ExecutionResult, StructTracer), ExecutionError> {
        let probe = self.isolated();
        for msg in predecessors {
            let tx_config = probe.next_tx_config(config.block_hash, H256::zero())?;
            probe.apply_message(msg, config, tx_config, true, None)?;
        }
        let mut tracer = match timeout {
            Some(deadline) => StructTracer::with_cancel(CancelToken::with_deadline(deadline)),
            None => StructTracer::new(),
        };
        let tx_config = probe.next_tx_config(config.block_hash, H256::zero())?;
        let result = probe.apply_message(target, config, tx_config, false, Some(&mut tracer))?;
        Ok((result, tracer))
    }

    /// Traces every transaction of a block sequentially against an isolated
    /// copy, committing each so later transactions see the right state. One
    /// deadline covers the whole block.
    pub fn trace_block(
        &self,
        msgs: &[Message],
        config: &EvmConfig,
        timeout: Option<Duration>,
    ) -> Result<Vec<(ExecutionResult, StructTracer)>, ExecutionError> {
        let probe = self.isolated();
        let token = timeout.map(CancelToken::with_deadline);
        let mut traces = Vec::with_capacity(msgs.len());
        for msg in msgs {
            let mut tracer = match &token {
                Some(token) => StructTracer::with_cancel(token.clone()),
                None => StructTracer::new(),
            };
            let tx_config = probe.next_tx_config(config.block_hash, H256::zero())?;
            let result = probe.apply_message(msg, config, tx_config, true, Some(&mut tracer))?;
            traces.push((result, tracer));
        }
        Ok(traces)
    }
}
