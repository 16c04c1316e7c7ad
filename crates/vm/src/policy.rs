use crate::errors::ExecutionError;
use ethereum_types::Address;
use ledgervm_common::types::{AccessControl, AccessControlType};

/// Create/call permission check bound to a fixed transaction signer at
/// construction, so evaluating it across many call frames in one
/// transaction is a plain membership test.
#[derive(Clone, Debug)]
pub struct PermissionPolicy {
    create: AccessControlType,
    call: AccessControlType,
    signer: Address,
}

impl PermissionPolicy {
    pub fn new(access_control: &AccessControl, signer: Address) -> Self {
        Self {
            create: access_control.create.clone(),
            call: access_control.call.clone(),
            signer,
        }
    }

    /// True when either the bound signer or the current frame's caller is
    /// allowed to deploy contracts.
    pub fn can_create(&self, caller: Address) -> bool {
        self.create.allows(&self.signer) || self.create.allows(&caller)
    }

    /// True when either the bound signer or the current frame's caller is
    /// allowed to perform a call. The recipient is accepted for symmetry
    /// with the create check; the policy keys on who initiates.
    pub fn can_call(&self, caller: Address, _recipient: Address) -> bool {
        self.call.allows(&self.signer) || self.call.allows(&caller)
    }

    /// [`PermissionPolicy::can_create`] lifted to an error: a denial aborts
    /// only the attempted CREATE, the surrounding frame decides what that
    /// means.
    pub fn check_create(&self, caller: Address) -> Result<(), ExecutionError> {
        if self.can_create(caller) {
            Ok(())
        } else {
            Err(ExecutionError::CreateNotAuthorized {
                signer: self.signer,
                caller,
            })
        }
    }

    pub fn check_call(&self, caller: Address, recipient: Address) -> Result<(), ExecutionError> {
        if self.can_call(caller, recipient) {
            Ok(())
        } else {
            Err(ExecutionError::CallNotAuthorized {
                signer: self.signer,
                caller,
            })
        }
    }
}
