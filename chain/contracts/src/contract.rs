//! Contract interface
//!
//! A contract turns an intent into a [`Transition`] without touching any
//! state. Execution then applies the transition's ledger delta atomically and,
//! only if that succeeds, commits the contract's own state update and events.

use crate::context::ExecutionContext;
use crate::errors::LedgerError;
use crate::events::ContractEvent;
use crate::ledger::{Ledger, LedgerView, StateDelta};

/// Validated, not-yet-applied result of an intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<U> {
    /// Ledger changes, applied all-or-nothing
    pub delta: StateDelta,
    /// Contract-local state change, committed after the delta
    pub update: U,
    pub events: Vec<ContractEvent>,
}

impl<U> Transition<U> {
    pub fn new(delta: StateDelta, update: U) -> Self {
        Self {
            delta,
            update,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: ContractEvent) -> Self {
        self.events.push(event);
        self
    }
}

pub trait Contract {
    type Intent;
    type Update;
    type Error: From<LedgerError>;

    /// Check every precondition and describe the resulting transition.
    fn validate(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        intent: &Self::Intent,
    ) -> Result<Transition<Self::Update>, Self::Error>;

    /// Commit a transition whose ledger delta has already been applied.
    fn commit(&mut self, update: Self::Update, events: Vec<ContractEvent>);

    /// Validate, apply and commit. Any failure leaves ledger and contract untouched.
    fn execute<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        intent: &Self::Intent,
    ) -> Result<(), Self::Error> {
        let transition = self.validate(ctx, &*ledger, intent)?;
        ledger.apply(&transition.delta)?;
        self.commit(transition.update, transition.events);
        Ok(())
    }
}
