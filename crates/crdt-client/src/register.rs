use crate::key::{RegisterKey, RegisterKind};
use crate::service::CrdtService;
use crate::update::{Operation, UpdateOp};

/// Builds updates for register keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterService;

impl RegisterService {
    /// Create the service.
    pub fn new() -> Self {
        Self
    }

    /// Overwrite the register with `value`.
    pub fn assign_register(&self, key: &RegisterKey, value: impl Into<String>) -> UpdateOp {
        UpdateOp::from_typed(key.typed(), Operation::AssignRegister(value.into()))
    }
}

impl CrdtService for RegisterService {
    type Kind = RegisterKind;
}
