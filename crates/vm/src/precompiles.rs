use crate::errors::PrecompileError;
use bytes::Bytes;
use ethereum_types::{Address, U256};
use ledgervm_statedb::StateDB;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Capability interface every precompiled contract satisfies. Business
/// logic lives behind it; the executor only needs the address, the gas
/// requirement and a way to run it against the ambient StateDB.
pub trait PrecompiledContract: Send + Sync {
    fn address(&self) -> Address;
    fn required_gas(&self, input: &[u8]) -> u64;
    fn run(
        &self,
        statedb: &mut StateDB,
        input: &[u8],
        caller: Address,
        value: U256,
    ) -> Result<Bytes, PrecompileError>;
}

/// Resolves a runtime-registered address (e.g. a token-factory deployment)
/// to a precompile instance.
pub trait DynamicPrecompileFactory: Send + Sync {
    fn instantiate(&self, address: Address) -> Result<Arc<dyn PrecompiledContract>, PrecompileError>;
}

/// Builds the process-wide registry once, then freezes it. Re-registering
/// an address is a programmer error and fails fast.
#[derive(Default)]
pub struct PrecompileRegistryBuilder {
    statics: FxHashMap<Address, Arc<dyn PrecompiledContract>>,
    dynamics: FxHashMap<Address, Arc<dyn PrecompiledContract>>,
}

impl PrecompileRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_static(
        mut self,
        contract: Arc<dyn PrecompiledContract>,
    ) -> Result<Self, PrecompileError> {
        let address = contract.address();
        if self.statics.contains_key(&address) || self.dynamics.contains_key(&address) {
            return Err(PrecompileError::AlreadyRegistered(address));
        }
        self.statics.insert(address, contract);
        Ok(self)
    }

    pub fn register_dynamic(
        mut self,
        contract: Arc<dyn PrecompiledContract>,
    ) -> Result<Self, PrecompileError> {
        let address = contract.address();
        if self.statics.contains_key(&address) || self.dynamics.contains_key(&address) {
            return Err(PrecompileError::AlreadyRegistered(address));
        }
        self.dynamics.insert(address, contract);
        Ok(self)
    }

    /// Registers every address the factory can resolve as a dynamic
    /// precompile.
    pub fn register_dynamic_from(
        mut self,
        factory: &dyn DynamicPrecompileFactory,
        addresses: &[Address],
    ) -> Result<Self, PrecompileError> {
        for address in addresses {
            self = self.register_dynamic(factory.instantiate(*address)?)?;
        }
        Ok(self)
    }

    pub fn build(self) -> PrecompileRegistry {
        debug!(
            statics = self.statics.len(),
            dynamics = self.dynamics.len(),
            "precompile registry frozen"
        );
        PrecompileRegistry {
            statics: self.statics,
            dynamics: self.dynamics,
        }
    }
}

/// Immutable address-keyed maps of every precompile the process knows
/// about, static and dynamic. Which subset is callable in a given block is
/// resolved per block by [`ActivePrecompiles`].
pub struct PrecompileRegistry {
    statics: FxHashMap<Address, Arc<dyn PrecompiledContract>>,
    dynamics: FxHashMap<Address, Arc<dyn PrecompiledContract>>,
}

impl PrecompileRegistry {
    pub fn is_registered(&self, address: &Address) -> bool {
        self.statics.contains_key(address) || self.dynamics.contains_key(address)
    }

    /// Resolves the active subset for one block from the params' active
    /// address lists.
    pub fn active(
        &self,
        active_static: &[Address],
        active_dynamic: &[Address],
    ) -> ActivePrecompiles {
        let mut active = FxHashMap::default();
        for address in active_static {
            if let Some(contract) = self.statics.get(address) {
                active.insert(*address, contract.clone());
            }
        }
        for address in active_dynamic {
            if let Some(contract) = self.dynamics.get(address) {
                active.insert(*address, contract.clone());
            }
        }
        let mut reserved: Vec<Address> = self
            .statics
            .keys()
            .chain(self.dynamics.keys())
            .filter(|address| !active.contains_key(address))
            .copied()
            .collect();
        reserved.sort();
        ActivePrecompiles { active, reserved }
    }
}

/// The per-block view of the registry: callable contracts plus the
/// reserved-but-inactive addresses that must not fall through to plain
/// account-call semantics.
pub struct ActivePrecompiles {
    active: FxHashMap<Address, Arc<dyn PrecompiledContract>>,
    reserved: Vec<Address>,
}

impl ActivePrecompiles {
    /// Whether `address` belongs to the registry at all, active or not.
    pub fn is_precompile(&self, address: &Address) -> bool {
        self.active.contains_key(address) || self.reserved.contains(address)
    }

    /// Active addresses in ascending order, used to seed the warm set.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.active.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Resolves a callable contract. Registered-but-inactive addresses get
    /// the distinguished inactive error; an address the registry has never
    /// seen is a startup wiring bug and fails fast.
    pub fn contract(
        &self,
        address: &Address,
    ) -> Result<Arc<dyn PrecompiledContract>, PrecompileError> {
        if let Some(contract) = self.active.get(address) {
            return Ok(contract.clone());
        }
        if self.reserved.contains(address) {
            return Err(PrecompileError::Inactive(*address));
        }
        panic!("precompile {address:#x} is not registered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        address: Address,
    }

    impl PrecompiledContract for Echo {
        fn address(&self) -> Address {
            self.address
        }

        fn required_gas(&self, input: &[u8]) -> u64 {
            input.len() as u64
        }

        fn run(
            &self,
            _statedb: &mut StateDB,
            input: &[u8],
            _caller: Address,
            _value: U256,
        ) -> Result<Bytes, PrecompileError> {
            Ok(Bytes::copy_from_slice(input))
        }
    }

    fn echo(byte: u8) -> Arc<dyn PrecompiledContract> {
        Arc::new(Echo {
            address: Address::repeat_byte(byte),
        })
    }

    #[test]
    fn double_registration_fails_fast() {
        let builder = PrecompileRegistryBuilder::new()
            .register_static(echo(1))
            .expect("first");
        let Err(err) = builder.register_dynamic(echo(1)) else {
            panic!("duplicate registration must fail");
        };
        assert!(matches!(err, PrecompileError::AlreadyRegistered(_)));
    }

    #[test]
    fn inactive_address_is_reserved_not_plain() {
        let registry = PrecompileRegistryBuilder::new()
            .register_static(echo(1))
            .expect("register")
            .register_static(echo(2))
            .expect("register")
            .build();
        let active = registry.active(&[Address::repeat_byte(1)], &[]);
        assert!(active.contract(&Address::repeat_byte(1)).is_ok());
        let Err(err) = active.contract(&Address::repeat_byte(2)) else {
            panic!("inactive precompile must not resolve");
        };
        assert!(matches!(err, PrecompileError::Inactive(_)));
        assert!(active.is_precompile(&Address::repeat_byte(2)));
        assert_eq!(active.addresses(), vec![Address::repeat_byte(1)]);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn unknown_address_panics() {
        let registry = PrecompileRegistryBuilder::new().build();
        let active = registry.active(&[], &[]);
        let _ = active.contract(&Address::repeat_byte(7));
    }
}
