use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

/// Destination of a message: contract creation or a call to an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxKind {
    Create,
    Call(Address),
}

/// One signed transaction's execution payload, already recovered and
/// admission-checked by the surrounding ledger. Fee deduction happens
/// outside the executor; what remains here is the state transition itself.
#[derive(Clone, Debug)]
pub struct Message {
    pub from: Address,
    pub to: TxKind,
    pub nonce: u64,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub data: Bytes,
    /// Declared EIP-2930 access list: `(address, storage keys)`.
    pub access_list: Vec<(Address, Vec<H256>)>,
}

impl Message {
    pub fn is_create(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }

    pub fn recipient(&self) -> Option<Address> {
        match self.to {
            TxKind::Create => None,
            TxKind::Call(address) => Some(address),
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            from: Address::zero(),
            to: TxKind::Create,
            nonce: 0,
            value: U256::zero(),
            gas_limit: 0,
            gas_price: U256::zero(),
            data: Bytes::new(),
            access_list: Vec::new(),
        }
    }
}
