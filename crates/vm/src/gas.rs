use crate::errors::ExecutionError;
use crate::message::Message;
use ledgervm_common::types::ChainRules;

pub const TX_GAS: u64 = 21_000;
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
pub const TX_DATA_ZERO_GAS: u64 = 4;
pub const TX_DATA_NON_ZERO_GAS_FRONTIER: u64 = 68;
/// EIP-2028 (Istanbul) lowered the non-zero byte cost.
pub const TX_DATA_NON_ZERO_GAS_EIP2028: u64 = 16;
pub const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
pub const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;

/// Refund divisor before the capped-refund fork rule activates.
pub const REFUND_QUOTIENT: u64 = 2;
/// EIP-3529 (London) caps refunds harder.
pub const REFUND_QUOTIENT_EIP3529: u64 = 5;

/// Minimum gas a message must provide before any execution, based on its
/// shape: base cost, per-byte data cost and per-access-list-entry cost,
/// fork dependent.
pub fn intrinsic_gas(msg: &Message, rules: &ChainRules) -> Result<u64, ExecutionError> {
    let mut gas = if msg.is_create() {
        TX_GAS_CONTRACT_CREATION
    } else {
        TX_GAS
    };

    if !msg.data.is_empty() {
        let non_zero_bytes = msg.data.iter().filter(|byte| **byte != 0).count() as u64;
        let zero_bytes = msg.data.len() as u64 - non_zero_bytes;
        let non_zero_cost = if rules.is_istanbul {
            TX_DATA_NON_ZERO_GAS_EIP2028
        } else {
            TX_DATA_NON_ZERO_GAS_FRONTIER
        };
        gas = non_zero_bytes
            .checked_mul(non_zero_cost)
            .and_then(|cost| gas.checked_add(cost))
            .ok_or(ExecutionError::GasOverflow)?;
        gas = zero_bytes
            .checked_mul(TX_DATA_ZERO_GAS)
            .and_then(|cost| gas.checked_add(cost))
            .ok_or(ExecutionError::GasOverflow)?;
    }

    if rules.is_berlin && !msg.access_list.is_empty() {
        let addresses = msg.access_list.len() as u64;
        let slots: u64 = msg.access_list.iter().map(|(_, keys)| keys.len() as u64).sum();
        gas = addresses
            .checked_mul(TX_ACCESS_LIST_ADDRESS_GAS)
            .and_then(|cost| gas.checked_add(cost))
            .ok_or(ExecutionError::GasOverflow)?;
        gas = slots
            .checked_mul(TX_ACCESS_LIST_STORAGE_KEY_GAS)
            .and_then(|cost| gas.checked_add(cost))
            .ok_or(ExecutionError::GasOverflow)?;
    }

    Ok(gas)
}

pub fn refund_quotient(is_london: bool) -> u64 {
    if is_london {
        REFUND_QUOTIENT_EIP3529
    } else {
        REFUND_QUOTIENT
    }
}

/// Era-dependent refund: the accumulated counter, capped at a quotient of
/// the gas actually used.
pub fn gas_to_refund(refund_counter: u64, gas_used: u64, is_london: bool) -> u64 {
    refund_counter.min(gas_used / refund_quotient(is_london))
}

/// Share of the declared gas limit a transaction is billed at minimum,
/// protecting against underpriced griefing via tiny actual usage relative
/// to a huge declared limit. Stored in basis points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinGasMultiplier(u32);

impl MinGasMultiplier {
    pub fn from_bps(bps: u32) -> Result<Self, ExecutionError> {
        if bps > 10_000 {
            return Err(ExecutionError::Custom(format!(
                "min gas multiplier {bps} exceeds 100%"
            )));
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// `gas_limit × multiplier`, the floor for the final billed gas. Errors
    /// if the result does not fit the gas counter's width.
    pub fn floor(&self, gas_limit: u64) -> Result<u64, ExecutionError> {
        let scaled = u128::from(gas_limit) * u128::from(self.0) / 10_000;
        u64::try_from(scaled).map_err(|_| ExecutionError::GasOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TxKind;
    use bytes::Bytes;
    use ethereum_types::{Address, H256};

    fn rules() -> ChainRules {
        ChainRules {
            chain_id: 1,
            is_istanbul: true,
            is_berlin: true,
            is_london: true,
        }
    }

    #[test]
    fn plain_transfer_costs_the_base_fee() {
        let msg = Message {
            to: TxKind::Call(Address::zero()),
            ..Default::default()
        };
        assert_eq!(intrinsic_gas(&msg, &rules()).expect("gas"), TX_GAS);
    }

    #[test]
    fn creation_data_and_access_list_add_up() {
        let msg = Message {
            to: TxKind::Create,
            data: Bytes::from_static(&[0x00, 0x01, 0x02]),
            access_list: vec![(Address::zero(), vec![H256::zero(), H256::zero()])],
            ..Default::default()
        };
        let expected = TX_GAS_CONTRACT_CREATION
            + TX_DATA_ZERO_GAS
            + 2 * TX_DATA_NON_ZERO_GAS_EIP2028
            + TX_ACCESS_LIST_ADDRESS_GAS
            + 2 * TX_ACCESS_LIST_STORAGE_KEY_GAS;
        assert_eq!(intrinsic_gas(&msg, &rules()).expect("gas"), expected);
    }

    #[test]
    fn pre_istanbul_charges_the_frontier_byte_cost() {
        let msg = Message {
            to: TxKind::Call(Address::zero()),
            data: Bytes::from_static(&[0xff]),
            ..Default::default()
        };
        let pre_istanbul = ChainRules {
            is_istanbul: false,
            ..rules()
        };
        assert_eq!(
            intrinsic_gas(&msg, &pre_istanbul).expect("gas"),
            TX_GAS + TX_DATA_NON_ZERO_GAS_FRONTIER
        );
    }

    #[test]
    fn refund_is_capped_by_the_era_quotient() {
        // Pre-fork: up to half of the gas used.
        assert_eq!(gas_to_refund(10_000, 10_000, false), 5_000);
        // Post-fork: only a fifth.
        assert_eq!(gas_to_refund(10_000, 10_000, true), 2_000);
        // The counter itself is the other bound.
        assert_eq!(gas_to_refund(100, 10_000, true), 100);
    }

    #[test]
    fn min_gas_floor_scales_by_basis_points() {
        let multiplier = MinGasMultiplier::from_bps(5_000).expect("multiplier");
        assert_eq!(multiplier.floor(100_000).expect("floor"), 50_000);
        assert_eq!(multiplier.floor(0).expect("floor"), 0);
        assert!(MinGasMultiplier::from_bps(10_001).is_err());
    }
}
