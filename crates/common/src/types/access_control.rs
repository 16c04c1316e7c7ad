use ethereum_types::Address;
use serde::{Deserialize, Serialize};

/// Who may perform a gated operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "addresses")]
pub enum AccessControlType {
    #[default]
    Everybody,
    Nobody,
    WhitelistAddress(Vec<Address>),
}

impl AccessControlType {
    pub fn allows(&self, address: &Address) -> bool {
        match self {
            AccessControlType::Everybody => true,
            AccessControlType::Nobody => false,
            AccessControlType::WhitelistAddress(list) => list.contains(address),
        }
    }
}

/// Access-control policy pair, one entry per gated operation kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    pub create: AccessControlType,
    pub call: AccessControlType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_membership() {
        let allowed = Address::repeat_byte(0x01);
        let denied = Address::repeat_byte(0x02);
        let policy = AccessControlType::WhitelistAddress(vec![allowed]);
        assert!(policy.allows(&allowed));
        assert!(!policy.allows(&denied));
        assert!(AccessControlType::Everybody.allows(&denied));
        assert!(!AccessControlType::Nobody.allows(&allowed));
    }
}
