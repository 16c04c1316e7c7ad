use ethereum_types::{H256, U256};

/// Keccak-256 of an arbitrary byte slice.
pub fn keccak(data: impl AsRef<[u8]>) -> H256 {
    keccak_hash::keccak(data.as_ref())
}

/// Converts a U256 to a big endian H256.
#[inline(always)]
pub fn u256_to_h256(value: U256) -> H256 {
    H256(value.to_big_endian())
}

/// Converts a big endian H256 to a U256.
#[inline(always)]
pub fn h256_to_u256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_KECCAK_HASH;

    #[test]
    fn keccak_of_empty_input_matches_empty_code_hash() {
        assert_eq!(keccak([]), EMPTY_KECCAK_HASH);
    }

    #[test]
    fn u256_h256_round_trip() {
        let value = U256::from(0xdead_beef_u64);
        assert_eq!(h256_to_u256(u256_to_h256(value)), value);
    }
}
