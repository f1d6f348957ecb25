//! Pool token holder: payouts out of one of a pool's reserves
//!
//! A pool's reserve in a custom token is held under that token's authority,
//! so the pool cannot move it directly. The holder builds the reserve-side
//! legs of swaps and withdrawals for one (pool, token) pair; the pool merges
//! them into its own transition so every leg lands or none does.

use types::fee::FeeBreakdown;
use types::ids::{Address, TokenId};
use types::numeric::Amount;

use crate::ledger::StateDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolTokenHolder {
    pool: Address,
    token: TokenId,
}

impl PoolTokenHolder {
    pub fn new(pool: Address, token: TokenId) -> Self {
        Self { pool, token }
    }

    pub fn pool(&self) -> &Address {
        &self.pool
    }

    pub fn token(&self) -> &TokenId {
        &self.token
    }

    /// Output side of a swap.
    ///
    /// The trader receives `amount_out`. The frontend and protocol fees go to
    /// their recipients; an unset recipient leaves its fee in the reserve.
    /// The LP fee always stays.
    pub fn swap_out(
        &self,
        trader: Address,
        fees: &FeeBreakdown,
        frontend: Option<Address>,
        protocol: Option<Address>,
    ) -> StateDelta {
        let mut delta = StateDelta::new();
        delta
            .transfer(self.pool, trader, self.token, fees.amount_out)
            .transfer(self.pool, frontend.unwrap_or(self.pool), self.token, fees.frontend_fee)
            .transfer(self.pool, protocol.unwrap_or(self.pool), self.token, fees.protocol_fee);
        delta
    }

    /// One asset's share of a liquidity withdrawal.
    pub fn withdraw(&self, recipient: Address, amount: Amount) -> StateDelta {
        let mut delta = StateDelta::new();
        delta.transfer(self.pool, recipient, self.token, amount);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BalanceChange, InMemoryLedger, Ledger, LedgerView};

    fn addr(tag: &[u8]) -> Address {
        Address::derive("test", &[tag])
    }

    #[test]
    fn test_unset_recipients_keep_fees_in_pool() {
        let holder = PoolTokenHolder::new(addr(b"pool"), TokenId::BASE);
        let fees = FeeBreakdown::from_gross(1_000_000, 10).unwrap();
        let delta = holder.swap_out(addr(b"trader"), &fees, None, None);
        assert_eq!(
            delta.changes(),
            &[BalanceChange::Transfer {
                from: addr(b"pool"),
                to: addr(b"trader"),
                token: TokenId::BASE,
                amount: 996_500,
            }]
        );
    }

    #[test]
    fn test_fees_paid_to_recipients() {
        let token = TokenId::derive(&addr(b"issuer"));
        let holder = PoolTokenHolder::new(addr(b"pool"), token);
        let mut ledger = InMemoryLedger::new();
        ledger.fund(addr(b"pool"), token, 2_000_000).unwrap();

        let fees = FeeBreakdown::from_gross(1_000_000, 10).unwrap();
        let delta = holder.swap_out(addr(b"trader"), &fees, Some(addr(b"frontend")), Some(addr(b"protocol")));
        ledger.apply(&delta).unwrap();

        assert_eq!(ledger.balance(&addr(b"trader"), &token), 996_500);
        assert_eq!(ledger.balance(&addr(b"frontend"), &token), 1_000);
        assert_eq!(ledger.balance(&addr(b"protocol"), &token), 500);
        assert_eq!(ledger.balance(&addr(b"pool"), &token), 1_002_000);
    }

    #[test]
    fn test_withdraw_leg() {
        let holder = PoolTokenHolder::new(addr(b"pool"), TokenId::BASE);
        assert_eq!(holder.withdraw(addr(b"lp"), 0).changes().len(), 0);
        assert_eq!(holder.withdraw(addr(b"lp"), 7).changes().len(), 1);
    }
}
