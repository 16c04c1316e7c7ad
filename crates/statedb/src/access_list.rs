use ethereum_types::{Address, H256};
use rustc_hash::{FxHashMap, FxHashSet};

/// Warm address/slot set per EIP-2929. Additions made during execution are
/// journaled by the StateDB so a revert also cools the entries again.
#[derive(Debug, Default, Clone)]
pub struct AccessList {
    addresses: FxHashSet<Address>,
    slots: FxHashMap<Address, FxHashSet<H256>>,
}

impl AccessList {
    pub fn contains_address(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    pub fn contains_slot(&self, address: &Address, key: &H256) -> bool {
        self.slots.get(address).is_some_and(|set| set.contains(key))
    }

    /// Returns whether the address was newly added.
    pub fn add_address(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// Returns `(address_added, slot_added)`.
    pub fn add_slot(&mut self, address: Address, key: H256) -> (bool, bool) {
        let address_added = self.addresses.insert(address);
        let slot_added = self.slots.entry(address).or_default().insert(key);
        (address_added, slot_added)
    }

    pub fn remove_address(&mut self, address: &Address) {
        self.addresses.remove(address);
    }

    pub fn remove_slot(&mut self, address: &Address, key: &H256) {
        if let Some(set) = self.slots.get_mut(address) {
            set.remove(key);
            if set.is_empty() {
                self.slots.remove(address);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_add_warms_the_address_too() {
        let mut list = AccessList::default();
        let address = Address::repeat_byte(0x01);
        let key = H256::repeat_byte(0x02);

        let (address_added, slot_added) = list.add_slot(address, key);
        assert!(address_added);
        assert!(slot_added);
        assert!(list.contains_address(&address));
        assert!(list.contains_slot(&address, &key));

        let (address_added, slot_added) = list.add_slot(address, key);
        assert!(!address_added);
        assert!(!slot_added);
    }
}
