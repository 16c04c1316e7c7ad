use crate::error::StorageError;
use ethereum_types::Address;
use ledgervm_common::types::{AccessControl, ChainConfig};
use serde::{Deserialize, Serialize};

/// Default share of the declared gas limit a transaction is billed at
/// minimum, in basis points.
pub const DEFAULT_MIN_GAS_MULTIPLIER_BPS: u32 = 5_000;

/// Singleton module configuration. Mutated only through the keeper's
/// validated `set_params`; reads hand out a copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Native gas denomination of the host ledger.
    pub evm_denom: String,
    /// Decimal precision of `evm_denom` (6 or 18).
    pub denom_decimals: u8,
    pub enable_create: bool,
    pub enable_call: bool,
    pub access_control: AccessControl,
    /// Active subset of the statically registered precompile addresses.
    pub active_static_precompiles: Vec<Address>,
    /// Active subset of the runtime-registered precompile addresses.
    pub active_dynamic_precompiles: Vec<Address>,
    /// Extra opcode-gas overrides, by EIP number.
    pub extra_eips: Vec<u64>,
    pub chain_config: ChainConfig,
    pub min_gas_multiplier_bps: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            evm_denom: "atoken".to_string(),
            denom_decimals: 18,
            enable_create: true,
            enable_call: true,
            access_control: AccessControl::default(),
            active_static_precompiles: Vec::new(),
            active_dynamic_precompiles: Vec::new(),
            extra_eips: Vec::new(),
            chain_config: ChainConfig::default(),
            min_gas_multiplier_bps: DEFAULT_MIN_GAS_MULTIPLIER_BPS,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.evm_denom.is_empty() {
            return Err(StorageError::InvalidParams(
                "evm denom cannot be empty".to_string(),
            ));
        }
        if self.denom_decimals != 6 && self.denom_decimals != 18 {
            return Err(StorageError::InvalidDecimals(self.denom_decimals));
        }
        validate_address_list("active static precompiles", &self.active_static_precompiles)?;
        validate_address_list(
            "active dynamic precompiles",
            &self.active_dynamic_precompiles,
        )?;
        if self.min_gas_multiplier_bps > 10_000 {
            return Err(StorageError::InvalidParams(format!(
                "min gas multiplier {} exceeds 100%",
                self.min_gas_multiplier_bps
            )));
        }
        let mut eips = self.extra_eips.clone();
        eips.sort_unstable();
        eips.dedup();
        if eips.len() != self.extra_eips.len() {
            return Err(StorageError::InvalidParams(
                "duplicate extra EIP override".to_string(),
            ));
        }
        Ok(())
    }
}

/// Active precompile lists must be sorted and duplicate free so membership
/// checks and genesis exports are deterministic.
fn validate_address_list(label: &str, addresses: &[Address]) -> Result<(), StorageError> {
    for pair in addresses.windows(2) {
        if pair[0] >= pair[1] {
            return Err(StorageError::InvalidParams(format!(
                "{label} must be sorted and unique, got {:#x} before {:#x}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        Params::default().validate().expect("default params");
    }

    #[test]
    fn unsorted_precompile_list_is_rejected() {
        let params = Params {
            active_static_precompiles: vec![Address::repeat_byte(2), Address::repeat_byte(1)],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn duplicate_precompile_address_is_rejected() {
        let params = Params {
            active_dynamic_precompiles: vec![Address::repeat_byte(1), Address::repeat_byte(1)],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn bad_decimals_and_multiplier_are_rejected() {
        let params = Params {
            denom_decimals: 12,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = Params {
            min_gas_multiplier_bps: 10_001,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn params_serde_round_trip() {
        let params = Params {
            active_static_precompiles: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
            extra_eips: vec![2200, 3855],
            ..Default::default()
        };
        let encoded = serde_json::to_vec(&params).expect("encode");
        let decoded: Params = serde_json::from_slice(&encoded).expect("decode");
        assert_eq!(decoded, params);
    }
}
