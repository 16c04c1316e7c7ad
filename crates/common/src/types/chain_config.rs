use serde::{Deserialize, Serialize};

/// Fork activation schedule for the chain. Heights are block numbers; `None`
/// means the fork never activates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub istanbul_block: Option<u64>,
    pub berlin_block: Option<u64>,
    pub london_block: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        // All forks active from genesis, matching a freshly started chain.
        Self {
            chain_id: 1,
            istanbul_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
        }
    }
}

impl ChainConfig {
    pub fn is_istanbul(&self, block_number: u64) -> bool {
        self.istanbul_block.is_some_and(|b| block_number >= b)
    }

    pub fn is_berlin(&self, block_number: u64) -> bool {
        self.berlin_block.is_some_and(|b| block_number >= b)
    }

    pub fn is_london(&self, block_number: u64) -> bool {
        self.london_block.is_some_and(|b| block_number >= b)
    }

    /// Resolves the rule set that applies at `block_number`. The result is
    /// frozen into the per-block EVM config so fork checks during execution
    /// are plain field reads.
    pub fn rules(&self, block_number: u64) -> ChainRules {
        ChainRules {
            chain_id: self.chain_id,
            is_istanbul: self.is_istanbul(block_number),
            is_berlin: self.is_berlin(block_number),
            is_london: self.is_london(block_number),
        }
    }
}

/// Fork rules resolved for one specific block height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainRules {
    pub chain_id: u64,
    pub is_istanbul: bool,
    pub is_berlin: bool,
    pub is_london: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_follow_activation_heights() {
        let config = ChainConfig {
            chain_id: 9000,
            istanbul_block: Some(0),
            berlin_block: Some(5),
            london_block: None,
        };
        let rules = config.rules(4);
        assert!(rules.is_istanbul);
        assert!(!rules.is_berlin);
        let rules = config.rules(5);
        assert!(rules.is_berlin);
        assert!(!rules.is_london);
    }
}
