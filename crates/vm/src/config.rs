use crate::errors::ExecutionError;
use crate::gas::MinGasMultiplier;
use ethereum_types::{Address, H256, U256};
use ledgervm_common::types::ChainRules;
use ledgervm_storage::{Params, ScaledFeeSource};

/// Per-block execution environment, frozen once before the first message of
/// the block is applied. Fork checks and params reads during execution are
/// plain field accesses.
#[derive(Clone, Debug)]
pub struct EvmConfig {
    pub rules: ChainRules,
    pub params: Params,
    pub coinbase: Address,
    pub base_fee: U256,
    pub block_number: u64,
    pub block_hash: H256,
    pub block_gas_limit: u64,
    pub min_gas_multiplier: MinGasMultiplier,
}

impl EvmConfig {
    /// Resolves the chain rules at `block_number` and validates the billing
    /// floor out of the stored params.
    pub fn assemble(
        params: Params,
        block_number: u64,
        block_hash: H256,
        coinbase: Address,
        base_fee: U256,
        block_gas_limit: u64,
    ) -> Result<Self, ExecutionError> {
        let rules = params.chain_config.rules(block_number);
        let min_gas_multiplier = MinGasMultiplier::from_bps(params.min_gas_multiplier_bps)?;
        Ok(Self {
            rules,
            params,
            coinbase,
            base_fee,
            block_number,
            block_hash,
            block_gas_limit,
            min_gas_multiplier,
        })
    }

    /// Like [`EvmConfig::assemble`], but reads the base fee from the host
    /// fee market, rescaled into 18-decimal precision.
    pub fn assemble_with_fees(
        params: Params,
        block_number: u64,
        block_hash: H256,
        coinbase: Address,
        fees: &ScaledFeeSource,
        block_gas_limit: u64,
    ) -> Result<Self, ExecutionError> {
        let base_fee = fees.base_fee()?;
        Self::assemble(
            params,
            block_number,
            block_hash,
            coinbase,
            base_fee,
            block_gas_limit,
        )
    }
}
