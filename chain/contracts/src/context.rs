//! Execution context passed to every contract call

use serde::{Deserialize, Serialize};
use types::ids::Address;
use types::numeric::Slot;

/// Who is calling, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Account submitting the transition
    pub sender: Address,
    /// Chain slot at which the transition is applied
    pub current_slot: Slot,
}

impl ExecutionContext {
    pub fn new(sender: Address, current_slot: Slot) -> Self {
        Self { sender, current_slot }
    }
}
