mod access_list;
mod config;
mod error;
mod journal;
mod statedb;

pub use config::TxConfig;
pub use error::StateDbError;
pub use statedb::StateDB;
