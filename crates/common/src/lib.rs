pub use bytes::Bytes;
pub use ethereum_types::{Address, Bloom, BloomInput, H160, H256, U256};

pub mod constants;
pub mod types;
pub mod utils;
