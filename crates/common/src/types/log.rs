use crate::utils::keccak;
use bytes::Bytes;
use ethereum_types::{Address, Bloom, BloomInput, H256};
use serde::{Deserialize, Serialize};

/// A single emitted event, stamped with the ambient transaction context by
/// the StateDB when it is appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
    pub block_hash: H256,
    pub tx_hash: H256,
    pub tx_index: u64,
    /// Block-scoped log index, drawn from the transient log-size counter.
    pub index: u64,
}

impl Log {
    pub fn new(address: Address, topics: Vec<H256>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
            ..Default::default()
        }
    }
}

/// OR-accumulates the addresses and topics of `logs` into a bloom filter.
pub fn bloom_from_logs(logs: &[Log]) -> Bloom {
    let mut bloom = Bloom::zero();
    for log in logs {
        let address_hash = keccak(log.address);
        bloom.accrue(BloomInput::Hash(address_hash.as_fixed_bytes()));
        for topic in log.topics.iter() {
            let topic_hash = keccak(topic);
            bloom.accrue(BloomInput::Hash(topic_hash.as_fixed_bytes()));
        }
    }
    bloom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_covers_log_address_and_topics() {
        let address = Address::repeat_byte(0xaa);
        let topic = H256::repeat_byte(0xbb);
        let log = Log::new(address, vec![topic], Bytes::new());
        let bloom = bloom_from_logs(std::slice::from_ref(&log));

        assert!(bloom.contains_input(BloomInput::Hash(keccak(address).as_fixed_bytes())));
        assert!(bloom.contains_input(BloomInput::Hash(keccak(topic).as_fixed_bytes())));
        assert!(!bloom.contains_input(BloomInput::Hash(
            keccak(H256::repeat_byte(0xcc)).as_fixed_bytes()
        )));
    }

    #[test]
    fn empty_log_set_yields_zero_bloom() {
        assert_eq!(bloom_from_logs(&[]), Bloom::zero());
    }
}
