//! Decimal wrappers reconciling the VM's fixed 18-decimal arithmetic with
//! the host ledger's configured precision.
//!
//! The conversion is a pure power-of-ten scale factor: identity when the
//! host denomination already uses 18 decimals, ×10^12 when it uses 6.
//! Scaling down truncates sub-scale remainders; this loss is accepted and
//! exercised by the round-trip tests below.

use crate::error::StorageError;
use crate::ledger::BankLedger;
use ethereum_types::{Address, U256};
use ledgervm_common::constants::ATTO_DECIMALS;
use std::sync::Arc;

/// Host denominations the keeper accepts.
const SUPPORTED_DECIMALS: [u8; 2] = [6, 18];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecimalConversion {
    factor: U256,
}

impl DecimalConversion {
    pub fn new(host_decimals: u8) -> Result<Self, StorageError> {
        if !SUPPORTED_DECIMALS.contains(&host_decimals) {
            return Err(StorageError::InvalidDecimals(host_decimals));
        }
        let exponent = u32::from(ATTO_DECIMALS - host_decimals);
        Ok(Self {
            factor: U256::from(10).pow(U256::from(exponent)),
        })
    }

    pub fn factor(&self) -> U256 {
        self.factor
    }

    /// Native amount → 18-decimal amount. Errors if the product does not
    /// fit in 256 bits.
    pub fn scale_up(&self, native: U256) -> Result<U256, StorageError> {
        native
            .checked_mul(self.factor)
            .ok_or(StorageError::AmountOverflow)
    }

    /// 18-decimal amount → native amount, truncating sub-scale remainders.
    pub fn scale_down(&self, atto: U256) -> U256 {
        atto / self.factor
    }
}

/// Balance adapter: every mutation scales the requested 18-decimal amount
/// down before touching the host ledger, every read scales the native
/// amount up before returning it to the VM.
#[derive(Clone)]
pub struct ScaledBank {
    bank: Arc<dyn BankLedger>,
    conversion: DecimalConversion,
}

impl ScaledBank {
    pub fn new(bank: Arc<dyn BankLedger>, conversion: DecimalConversion) -> Self {
        Self { bank, conversion }
    }

    pub fn balance_of(&self, address: Address) -> Result<U256, StorageError> {
        let native = self.bank.balance_of(address)?;
        self.conversion.scale_up(native)
    }

    pub fn mint_to(&self, address: Address, atto: U256) -> Result<(), StorageError> {
        self.bank.mint_to(address, self.conversion.scale_down(atto))
    }

    pub fn burn_from(&self, address: Address, atto: U256) -> Result<(), StorageError> {
        self.bank
            .burn_from(address, self.conversion.scale_down(atto))
    }

    pub fn send(&self, from: Address, to: Address, atto: U256) -> Result<(), StorageError> {
        self.bank.send(from, to, self.conversion.scale_down(atto))
    }
}

/// Base-fee / minimum-gas-price source in the host's native precision.
pub trait FeeSource: Send + Sync {
    fn base_fee(&self) -> Result<U256, StorageError>;

    fn min_gas_price(&self) -> Result<U256, StorageError>;
}

/// Fee adapter mirroring [`ScaledBank`] for the fee-market reads.
#[derive(Clone)]
pub struct ScaledFeeSource {
    source: Arc<dyn FeeSource>,
    conversion: DecimalConversion,
}

impl ScaledFeeSource {
    pub fn new(source: Arc<dyn FeeSource>, conversion: DecimalConversion) -> Self {
        Self { source, conversion }
    }

    pub fn base_fee(&self) -> Result<U256, StorageError> {
        self.conversion.scale_up(self.source.base_fee()?)
    }

    pub fn min_gas_price(&self) -> Result<U256, StorageError> {
        self.conversion.scale_up(self.source.min_gas_price()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_decimal_host_scales_by_ten_to_the_twelfth() {
        let conversion = DecimalConversion::new(6).expect("conversion");
        assert_eq!(conversion.factor(), U256::from(10).pow(U256::from(12)));
        let conversion = DecimalConversion::new(18).expect("conversion");
        assert_eq!(conversion.factor(), U256::one());
    }

    #[test]
    fn unsupported_precision_is_rejected() {
        assert!(matches!(
            DecimalConversion::new(9),
            Err(StorageError::InvalidDecimals(9))
        ));
    }

    #[test]
    fn round_trip_is_exact_for_factor_multiples() {
        let conversion = DecimalConversion::new(6).expect("conversion");
        let exact = U256::from(5_000_000_000_000_u64);
        assert_eq!(
            conversion.scale_up(conversion.scale_down(exact)).expect("scale"),
            exact
        );
    }

    #[test]
    fn sub_scale_remainders_truncate_to_zero() {
        let conversion = DecimalConversion::new(6).expect("conversion");
        assert_eq!(conversion.scale_down(U256::one()), U256::zero());
        // One native unit short of a full factor still truncates.
        let almost = U256::from(10).pow(U256::from(12)) - 1;
        assert_eq!(conversion.scale_down(almost), U256::zero());
    }

    #[test]
    fn scale_up_overflow_is_an_error() {
        let conversion = DecimalConversion::new(6).expect("conversion");
        assert!(conversion.scale_up(U256::MAX).is_err());
    }
}
