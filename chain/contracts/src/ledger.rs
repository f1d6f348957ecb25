//! Ledger: balances by (owner, asset) and atomic application of state deltas
//!
//! The protocol never mutates balances directly. Contracts describe the
//! balance changes of a transition as a [`StateDelta`] and the ledger applies
//! it all-or-nothing:
//! - reads go through [`LedgerView`]
//! - writes go through [`Ledger::apply`]
//!
//! [`InMemoryLedger`] is the reference implementation used by tests and
//! off-chain simulation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::{Address, TokenId};
use types::numeric::Amount;

use crate::errors::LedgerError;

/// One balance change inside a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceChange {
    Transfer {
        from: Address,
        to: Address,
        token: TokenId,
        amount: Amount,
    },
    Mint {
        to: Address,
        token: TokenId,
        amount: Amount,
    },
    Burn {
        from: Address,
        token: TokenId,
        amount: Amount,
    },
    /// Open an account; fails if it already exists.
    CreateAccount { owner: Address, token: TokenId },
}

/// Ordered balance changes of one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    changes: Vec<BalanceChange>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transfer. Zero-amount transfers are skipped.
    pub fn transfer(&mut self, from: Address, to: Address, token: TokenId, amount: Amount) -> &mut Self {
        if amount > 0 && from != to {
            self.changes.push(BalanceChange::Transfer {
                from,
                to,
                token,
                amount,
            });
        }
        self
    }

    pub fn mint(&mut self, to: Address, token: TokenId, amount: Amount) -> &mut Self {
        if amount > 0 {
            self.changes.push(BalanceChange::Mint { to, token, amount });
        }
        self
    }

    pub fn burn(&mut self, from: Address, token: TokenId, amount: Amount) -> &mut Self {
        if amount > 0 {
            self.changes.push(BalanceChange::Burn { from, token, amount });
        }
        self
    }

    pub fn create_account(&mut self, owner: Address, token: TokenId) -> &mut Self {
        self.changes.push(BalanceChange::CreateAccount { owner, token });
        self
    }

    /// Append every change of `other`, keeping order.
    pub fn extend(&mut self, other: StateDelta) -> &mut Self {
        self.changes.extend(other.changes);
        self
    }

    pub fn changes(&self) -> &[BalanceChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Read access to ledger balances.
pub trait LedgerView {
    /// Balance of `owner` in `token` (zero for missing accounts).
    fn balance(&self, owner: &Address, token: &TokenId) -> Amount;

    fn account_exists(&self, owner: &Address, token: &TokenId) -> bool;
}

/// Ledger that applies transitions atomically.
pub trait Ledger: LedgerView {
    /// Apply every change in `delta`, or none of them.
    fn apply(&mut self, delta: &StateDelta) -> Result<(), LedgerError>;
}

/// In-memory ledger.
///
/// Balances are stored as `owner -> (token -> amount)`. An entry with a zero
/// amount is an open, empty account.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, HashMap<TokenId, Amount>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account outside of any transition (genesis funding).
    pub fn fund(&mut self, owner: Address, token: TokenId, amount: Amount) -> Result<(), LedgerError> {
        let mut delta = StateDelta::new();
        delta.mint(owner, token, amount);
        self.apply(&delta)
    }

    /// Total supply of `token` across all accounts.
    pub fn total_supply(&self, token: &TokenId) -> u128 {
        self.balances
            .values()
            .filter_map(|assets| assets.get(token))
            .map(|amount| *amount as u128)
            .sum()
    }
}

impl LedgerView for InMemoryLedger {
    fn balance(&self, owner: &Address, token: &TokenId) -> Amount {
        self.balances
            .get(owner)
            .and_then(|assets| assets.get(token))
            .copied()
            .unwrap_or(0)
    }

    fn account_exists(&self, owner: &Address, token: &TokenId) -> bool {
        self.balances
            .get(owner)
            .is_some_and(|assets| assets.contains_key(token))
    }
}

impl Ledger for InMemoryLedger {
    fn apply(&mut self, delta: &StateDelta) -> Result<(), LedgerError> {
        let mut staged = Staged {
            base: self,
            overlay: HashMap::new(),
        };
        for change in delta.changes() {
            staged.apply_change(change)?;
        }

        let overlay = staged.overlay;
        for ((owner, token), amount) in overlay {
            self.balances.entry(owner).or_default().insert(token, amount);
        }
        Ok(())
    }
}

/// Pending writes layered over a ledger; discarded unless every change succeeds.
struct Staged<'a> {
    base: &'a InMemoryLedger,
    overlay: HashMap<(Address, TokenId), Amount>,
}

impl Staged<'_> {
    fn current(&self, owner: &Address, token: &TokenId) -> Option<Amount> {
        match self.overlay.get(&(*owner, *token)) {
            Some(amount) => Some(*amount),
            None => self
                .base
                .account_exists(owner, token)
                .then(|| self.base.balance(owner, token)),
        }
    }

    fn apply_change(&mut self, change: &BalanceChange) -> Result<(), LedgerError> {
        match change {
            BalanceChange::Transfer {
                from,
                to,
                token,
                amount,
            } => {
                self.safe_debit(from, token, *amount)?;
                self.safe_credit(to, token, *amount)
            }
            BalanceChange::Mint { to, token, amount } => self.safe_credit(to, token, *amount),
            BalanceChange::Burn { from, token, amount } => self.safe_debit(from, token, *amount),
            BalanceChange::CreateAccount { owner, token } => {
                if self.current(owner, token).is_some() {
                    return Err(LedgerError::AccountExists {
                        owner: *owner,
                        token: *token,
                    });
                }
                self.overlay.insert((*owner, *token), 0);
                Ok(())
            }
        }
    }

    fn safe_credit(&mut self, owner: &Address, token: &TokenId, amount: Amount) -> Result<(), LedgerError> {
        let current = self.current(owner, token).unwrap_or(0);
        let new_balance = current.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.overlay.insert((*owner, *token), new_balance);
        Ok(())
    }

    fn safe_debit(&mut self, owner: &Address, token: &TokenId, amount: Amount) -> Result<(), LedgerError> {
        let current = self.current(owner, token).unwrap_or(0);
        if current < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: *owner,
                token: *token,
                required: amount,
                available: current,
            });
        }
        self.overlay.insert((*owner, *token), current - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: &[u8]) -> Address {
        Address::derive("test", &[tag])
    }

    fn token(tag: &[u8]) -> TokenId {
        TokenId::derive(&addr(tag))
    }

    #[test]
    fn test_fund_and_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(addr(b"alice"), TokenId::BASE, 500).unwrap();
        assert_eq!(ledger.balance(&addr(b"alice"), &TokenId::BASE), 500);
        assert_eq!(ledger.balance(&addr(b"bob"), &TokenId::BASE), 0);
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(addr(b"alice"), TokenId::BASE, 500).unwrap();

        let mut delta = StateDelta::new();
        delta.transfer(addr(b"alice"), addr(b"bob"), TokenId::BASE, 200);
        ledger.apply(&delta).unwrap();

        assert_eq!(ledger.balance(&addr(b"alice"), &TokenId::BASE), 300);
        assert_eq!(ledger.balance(&addr(b"bob"), &TokenId::BASE), 200);
    }

    #[test]
    fn test_failed_change_rolls_back_whole_delta() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(addr(b"alice"), TokenId::BASE, 100).unwrap();

        let mut delta = StateDelta::new();
        delta
            .transfer(addr(b"alice"), addr(b"bob"), TokenId::BASE, 60)
            .transfer(addr(b"alice"), addr(b"carol"), TokenId::BASE, 60);

        let err = ledger.apply(&delta).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                owner: addr(b"alice"),
                token: TokenId::BASE,
                required: 60,
                available: 40,
            }
        );
        assert_eq!(ledger.balance(&addr(b"alice"), &TokenId::BASE), 100);
        assert_eq!(ledger.balance(&addr(b"bob"), &TokenId::BASE), 0);
    }

    #[test]
    fn test_later_changes_see_earlier_ones() {
        let mut ledger = InMemoryLedger::new();
        let mut delta = StateDelta::new();
        delta
            .mint(addr(b"alice"), token(b"t"), 10)
            .transfer(addr(b"alice"), addr(b"bob"), token(b"t"), 10);
        ledger.apply(&delta).unwrap();
        assert_eq!(ledger.balance(&addr(b"bob"), &token(b"t")), 10);
    }

    #[test]
    fn test_create_account_twice_fails() {
        let mut ledger = InMemoryLedger::new();
        let mut delta = StateDelta::new();
        delta.create_account(addr(b"pool"), TokenId::BASE);
        ledger.apply(&delta).unwrap();
        assert!(ledger.account_exists(&addr(b"pool"), &TokenId::BASE));

        assert_eq!(
            ledger.apply(&delta),
            Err(LedgerError::AccountExists {
                owner: addr(b"pool"),
                token: TokenId::BASE
            })
        );
    }

    #[test]
    fn test_mint_overflow() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(addr(b"alice"), TokenId::BASE, u64::MAX).unwrap();
        assert_eq!(
            ledger.fund(addr(b"alice"), TokenId::BASE, 1),
            Err(LedgerError::Overflow)
        );
        assert_eq!(ledger.balance(&addr(b"alice"), &TokenId::BASE), u64::MAX);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(addr(b"alice"), token(b"lp"), 1_000).unwrap();
        let mut delta = StateDelta::new();
        delta.burn(addr(b"alice"), token(b"lp"), 400);
        ledger.apply(&delta).unwrap();
        assert_eq!(ledger.total_supply(&token(b"lp")), 600);
    }

    #[test]
    fn test_zero_and_self_transfers_are_skipped() {
        let mut delta = StateDelta::new();
        delta
            .transfer(addr(b"a"), addr(b"b"), TokenId::BASE, 0)
            .transfer(addr(b"a"), addr(b"a"), TokenId::BASE, 5);
        assert!(delta.is_empty());
    }
}
