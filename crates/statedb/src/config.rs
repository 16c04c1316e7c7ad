use ethereum_types::H256;

/// Ambient per-transaction context. Every log appended through the StateDB
/// is stamped with these fields; `log_index` is the block-scoped counter
/// value at the start of the transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxConfig {
    pub block_hash: H256,
    pub tx_hash: H256,
    pub tx_index: u64,
    pub log_index: u64,
}

impl TxConfig {
    pub fn new(block_hash: H256, tx_hash: H256, tx_index: u64, log_index: u64) -> Self {
        Self {
            block_hash,
            tx_hash,
            tx_index,
            log_index,
        }
    }
}
