mod account;
mod access_control;
mod chain_config;
mod log;

pub use access_control::{AccessControl, AccessControlType};
pub use account::{Account, AccountInfo, Code};
pub use chain_config::{ChainConfig, ChainRules};
pub use log::{Log, bloom_from_logs};
