use ethereum_types::H256;

/// Keccak-256 hash of the empty byte string. Accounts without code carry
/// this hash, never a zero hash.
pub const EMPTY_KECCAK_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
]);

/// Decimal precision of the VM's fixed-point balance arithmetic.
pub const ATTO_DECIMALS: u8 = 18;
