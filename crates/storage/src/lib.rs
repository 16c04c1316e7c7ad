mod decimals;
mod error;
mod keeper;
mod keys;
mod kv;
mod ledger;
mod params;
mod transient;

pub use decimals::{DecimalConversion, FeeSource, ScaledBank, ScaledFeeSource};
pub use error::StorageError;
pub use keeper::{Keeper, module_address};
pub use kv::{InMemoryStore, KvStore};
pub use ledger::{AccountLedger, BankLedger, InMemoryLedger, LedgerAccount};
pub use params::{DEFAULT_MIN_GAS_MULTIPLIER_BPS, Params};
pub use transient::TransientStore;
