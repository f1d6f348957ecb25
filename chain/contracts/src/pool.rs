//! Pool: constant-product AMM for one asset pair
//!
//! Reserves are not stored here: the pool's ledger balance in an asset *is*
//! its reserve. The pool tracks only its pair, its liquidity supply and the
//! addresses it reads from its factory.
//!
//! Every operation is validated against caller-supplied reserve/supply bounds
//! and fails cleanly if the live state has drifted outside them.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::fee::FeeBreakdown;
use types::ids::{Address, TokenId};
use types::numeric::Amount;

use crate::config::ProtocolConfig;
use crate::context::ExecutionContext;
use crate::contract::{Contract, Transition};
use crate::errors::PoolError;
use crate::events::{
    ContractEvent, LiquidityAction, LiquidityEvent, SwapEvent, UpdateUserEvent, UpdateVerificationKeyEvent,
};
use crate::factory::PoolFactory;
use crate::ledger::{Ledger, LedgerView, StateDelta};
use crate::math;
use crate::merkle::compute_hash;
use crate::multisig::UpdateTarget;
use crate::quote::SwapQuote;
use crate::token_holder::PoolTokenHolder;

/// Swap `amount_in` of `token_in` for the pool's other asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    pub token_in: TokenId,
    pub amount_in: Amount,
    /// Slippage bound on what the trader receives
    pub amount_out_min: Amount,
    /// Highest input reserve the trader accepts
    pub balance_in_max: Amount,
    /// Lowest output reserve the trader accepts
    pub balance_out_min: Amount,
    pub frontend: Option<Address>,
    pub frontend_fee_bps: u64,
}

/// Add liquidity to a pool that already has some.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyParams {
    pub amount0: Amount,
    pub amount1: Amount,
    pub reserve0_max: Amount,
    pub reserve1_max: Amount,
    pub supply_min: Amount,
}

/// Burn liquidity shares for a proportional share of both reserves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawParams {
    pub liquidity: Amount,
    pub amount0_min: Amount,
    pub amount1_min: Amount,
    pub reserve0_min: Amount,
    pub reserve1_min: Amount,
    pub supply_max: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolIntent {
    SupplyFirst { amount0: Amount, amount1: Amount },
    Supply(SupplyParams),
    Swap(SwapParams),
    Withdraw(WithdrawParams),
}

/// Pool-local state written by a committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUpdate {
    pub liquidity_supply: Amount,
}

#[derive(Debug, Clone)]
pub struct Pool {
    address: Address,
    token0: TokenId,
    token1: TokenId,
    factory: Address,
    protocol: Option<Address>,
    delegator: Option<Address>,
    liquidity_supply: Amount,
    verification_key_hash: [u8; 32],
    config: ProtocolConfig,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl Pool {
    /// Instantiate a pool for `token0`/`token1`, reading protocol-wide values
    /// from `factory`.
    pub(crate) fn from_factory(address: Address, token0: TokenId, token1: TokenId, factory: &PoolFactory) -> Self {
        Self {
            address,
            token0,
            token1,
            factory: *factory.address(),
            protocol: factory.protocol(),
            delegator: factory.delegator(),
            liquidity_supply: 0,
            verification_key_hash: *factory.pool_verification_key_hash(),
            config: *factory.config(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn token0(&self) -> &TokenId {
        &self.token0
    }

    pub fn token1(&self) -> &TokenId {
        &self.token1
    }

    pub fn factory(&self) -> &Address {
        &self.factory
    }

    pub fn protocol(&self) -> Option<Address> {
        self.protocol
    }

    pub fn delegator(&self) -> Option<Address> {
        self.delegator
    }

    pub fn liquidity_supply(&self) -> Amount {
        self.liquidity_supply
    }

    pub fn verification_key_hash(&self) -> &[u8; 32] {
        &self.verification_key_hash
    }

    /// Token id of this pool's liquidity shares.
    pub fn liquidity_token(&self) -> TokenId {
        TokenId::derive(&self.address)
    }

    /// Live reserves `(token0, token1)`.
    pub fn reserves(&self, ledger: &dyn LedgerView) -> (Amount, Amount) {
        (
            ledger.balance(&self.address, &self.token0),
            ledger.balance(&self.address, &self.token1),
        )
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    fn holder(&self, token: TokenId) -> PoolTokenHolder {
        PoolTokenHolder::new(self.address, token)
    }

    /// The pair's other asset, or `UnknownToken`.
    fn counter_token(&self, token: &TokenId) -> Result<TokenId, PoolError> {
        if *token == self.token0 {
            Ok(self.token1)
        } else if *token == self.token1 {
            Ok(self.token0)
        } else {
            Err(PoolError::UnknownToken { token: *token })
        }
    }

    // ───────────────────────── Liquidity & Swaps ─────────────────────────

    pub fn supply_first_liquidity<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        amount0: Amount,
        amount1: Amount,
    ) -> Result<(), PoolError> {
        self.execute(ctx, ledger, &PoolIntent::SupplyFirst { amount0, amount1 })
    }

    pub fn supply_liquidity<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        params: SupplyParams,
    ) -> Result<(), PoolError> {
        self.execute(ctx, ledger, &PoolIntent::Supply(params))
    }

    pub fn swap<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        params: SwapParams,
    ) -> Result<(), PoolError> {
        self.execute(ctx, ledger, &PoolIntent::Swap(params))
    }

    pub fn withdraw_liquidity<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        params: WithdrawParams,
    ) -> Result<(), PoolError> {
        self.execute(ctx, ledger, &PoolIntent::Withdraw(params))
    }

    /// Quote a swap against the live reserves.
    pub fn quote(
        &self,
        ledger: &dyn LedgerView,
        token_in: &TokenId,
        amount_in: Amount,
        frontend_fee_bps: u64,
    ) -> Result<SwapQuote, PoolError> {
        let token_out = self.counter_token(token_in)?;
        let reserve_in = ledger.balance(&self.address, token_in);
        let reserve_out = ledger.balance(&self.address, &token_out);
        SwapQuote::new(reserve_in, reserve_out, amount_in, frontend_fee_bps)
    }

    fn validate_supply_first(
        &self,
        ctx: &ExecutionContext,
        amount0: Amount,
        amount1: Amount,
    ) -> Result<Transition<PoolUpdate>, PoolError> {
        if self.liquidity_supply != 0 {
            return Err(PoolError::AlreadySupplied);
        }
        let (shares, supply) = math::first_liquidity(amount0, amount1, self.config.minimum_liquidity)?;

        let lp_token = self.liquidity_token();
        let mut delta = StateDelta::new();
        delta
            .transfer(ctx.sender, self.address, self.token0, amount0)
            .transfer(ctx.sender, self.address, self.token1, amount1)
            .mint(Address::BURN, lp_token, self.config.minimum_liquidity)
            .mint(ctx.sender, lp_token, shares);

        let event = LiquidityEvent {
            pool: self.address,
            sender: ctx.sender,
            action: LiquidityAction::Supply,
            amount0,
            amount1,
            liquidity: shares,
        };
        Ok(Transition::new(delta, PoolUpdate { liquidity_supply: supply })
            .with_event(ContractEvent::Liquidity(event)))
    }

    fn validate_supply(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        p: &SupplyParams,
    ) -> Result<Transition<PoolUpdate>, PoolError> {
        if self.liquidity_supply == 0 {
            return Err(PoolError::NotSupplied);
        }
        let (reserve0, reserve1) = self.reserves(ledger);
        if reserve0 > p.reserve0_max || reserve1 > p.reserve1_max || self.liquidity_supply < p.supply_min {
            return Err(PoolError::InsufficientLiquidity);
        }

        let shares = math::supply_liquidity(p.amount0, p.amount1, p.reserve0_max, p.reserve1_max, p.supply_min)?;
        let supply = self.liquidity_supply.checked_add(shares).ok_or(PoolError::Overflow)?;

        let mut delta = StateDelta::new();
        delta
            .transfer(ctx.sender, self.address, self.token0, p.amount0)
            .transfer(ctx.sender, self.address, self.token1, p.amount1)
            .mint(ctx.sender, self.liquidity_token(), shares);

        let event = LiquidityEvent {
            pool: self.address,
            sender: ctx.sender,
            action: LiquidityAction::Supply,
            amount0: p.amount0,
            amount1: p.amount1,
            liquidity: shares,
        };
        Ok(Transition::new(delta, PoolUpdate { liquidity_supply: supply })
            .with_event(ContractEvent::Liquidity(event)))
    }

    fn validate_swap(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        p: &SwapParams,
    ) -> Result<Transition<PoolUpdate>, PoolError> {
        let token_out = self.counter_token(&p.token_in)?;
        if p.amount_in == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if p.frontend_fee_bps > self.config.max_frontend_fee_bps {
            return Err(PoolError::FrontendFeeTooHigh {
                requested: p.frontend_fee_bps,
                max: self.config.max_frontend_fee_bps,
            });
        }

        let reserve_in = ledger.balance(&self.address, &p.token_in);
        let reserve_out = ledger.balance(&self.address, &token_out);
        if self.liquidity_supply == 0 || reserve_out == 0 {
            return Err(PoolError::NotSupplied);
        }
        if reserve_in > p.balance_in_max || reserve_out < p.balance_out_min {
            return Err(PoolError::InsufficientLiquidity);
        }

        let gross = math::swap_output(p.amount_in, p.balance_in_max, p.balance_out_min)?;
        let fees = FeeBreakdown::from_gross(gross, p.frontend_fee_bps).ok_or(PoolError::Overflow)?;
        if fees.amount_out < p.amount_out_min {
            return Err(PoolError::InsufficientOutput);
        }

        let mut delta = StateDelta::new();
        delta.transfer(ctx.sender, self.address, p.token_in, p.amount_in);
        delta.extend(self.holder(token_out).swap_out(ctx.sender, &fees, p.frontend, self.protocol));

        let event = SwapEvent {
            pool: self.address,
            sender: ctx.sender,
            token_in: p.token_in,
            amount_in: p.amount_in,
            amount_out: fees.amount_out,
        };
        Ok(Transition::new(
            delta,
            PoolUpdate {
                liquidity_supply: self.liquidity_supply,
            },
        )
        .with_event(ContractEvent::Swap(event)))
    }

    fn validate_withdraw(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        p: &WithdrawParams,
    ) -> Result<Transition<PoolUpdate>, PoolError> {
        if p.liquidity == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if self.liquidity_supply == 0 {
            return Err(PoolError::NotSupplied);
        }
        let (reserve0, reserve1) = self.reserves(ledger);
        if reserve0 < p.reserve0_min || reserve1 < p.reserve1_min || self.liquidity_supply > p.supply_max {
            return Err(PoolError::InsufficientLiquidity);
        }

        let amount0 = math::withdraw_amount(p.reserve0_min, p.liquidity, p.supply_max)?;
        let amount1 = math::withdraw_amount(p.reserve1_min, p.liquidity, p.supply_max)?;
        if amount0 < p.amount0_min || amount1 < p.amount1_min {
            return Err(PoolError::InsufficientOutput);
        }
        let supply = self
            .liquidity_supply
            .checked_sub(p.liquidity)
            .ok_or(PoolError::InsufficientLiquidity)?;

        let mut delta = StateDelta::new();
        delta.burn(ctx.sender, self.liquidity_token(), p.liquidity);
        delta.extend(self.holder(self.token0).withdraw(ctx.sender, amount0));
        delta.extend(self.holder(self.token1).withdraw(ctx.sender, amount1));

        let event = LiquidityEvent {
            pool: self.address,
            sender: ctx.sender,
            action: LiquidityAction::Withdraw,
            amount0,
            amount1,
            liquidity: p.liquidity,
        };
        Ok(Transition::new(delta, PoolUpdate { liquidity_supply: supply })
            .with_event(ContractEvent::Liquidity(event)))
    }

    // ───────────────────────── Factory Sync ─────────────────────────

    fn check_factory(&self, factory: &PoolFactory) -> Result<(), PoolError> {
        if *factory.address() != self.factory {
            return Err(PoolError::FactoryMismatch {
                actual: *factory.address(),
            });
        }
        Ok(())
    }

    /// Copy the factory's current protocol address. Callable by anyone.
    pub fn set_protocol(&mut self, factory: &PoolFactory) -> Result<(), PoolError> {
        self.check_factory(factory)?;
        self.protocol = factory.protocol();
        info!(pool = %self.address, protocol = ?self.protocol, "Pool protocol address synced");
        self.events.push(ContractEvent::UpdateUser(UpdateUserEvent {
            target: UpdateTarget::Protocol,
            new_address: self.protocol,
        }));
        Ok(())
    }

    /// Copy the factory's current delegate. Callable by anyone.
    pub fn set_delegator(&mut self, factory: &PoolFactory) -> Result<(), PoolError> {
        self.check_factory(factory)?;
        self.delegator = factory.delegator();
        info!(pool = %self.address, delegator = ?self.delegator, "Pool delegator synced");
        self.events.push(ContractEvent::UpdateUser(UpdateUserEvent {
            target: UpdateTarget::Delegator,
            new_address: self.delegator,
        }));
        Ok(())
    }

    /// Adopt a new verification key, provided the factory has approved its hash.
    pub fn update_verification_key(&mut self, factory: &PoolFactory, verification_key: &[u8]) -> Result<(), PoolError> {
        self.check_factory(factory)?;
        let hash = compute_hash(verification_key);
        if hash != *factory.pool_verification_key_hash() {
            return Err(PoolError::VerificationKeyMismatch);
        }
        self.verification_key_hash = hash;
        info!(pool = %self.address, hash = %hex::encode(hash), "Pool verification key updated");
        self.events
            .push(ContractEvent::UpdateVerificationKey(UpdateVerificationKeyEvent { hash }));
        Ok(())
    }
}

impl Contract for Pool {
    type Intent = PoolIntent;
    type Update = PoolUpdate;
    type Error = PoolError;

    fn validate(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        intent: &PoolIntent,
    ) -> Result<Transition<PoolUpdate>, PoolError> {
        match intent {
            PoolIntent::SupplyFirst { amount0, amount1 } => self.validate_supply_first(ctx, *amount0, *amount1),
            PoolIntent::Supply(params) => self.validate_supply(ctx, ledger, params),
            PoolIntent::Swap(params) => self.validate_swap(ctx, ledger, params),
            PoolIntent::Withdraw(params) => self.validate_withdraw(ctx, ledger, params),
        }
    }

    fn commit(&mut self, update: PoolUpdate, events: Vec<ContractEvent>) {
        self.liquidity_supply = update.liquidity_supply;
        for event in &events {
            match event {
                ContractEvent::Swap(e) => debug!(
                    pool = %self.address,
                    sender = %e.sender,
                    token_in = %e.token_in,
                    amount_in = e.amount_in,
                    amount_out = e.amount_out,
                    "Swap executed"
                ),
                ContractEvent::Liquidity(e) => debug!(
                    pool = %self.address,
                    sender = %e.sender,
                    action = ?e.action,
                    liquidity = e.liquidity,
                    supply = self.liquidity_supply,
                    "Liquidity changed"
                ),
                _ => {}
            }
        }
        self.events.extend(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentConfig, Network};
    use crate::ledger::InMemoryLedger;
    use crate::multisig::{address_value, deploy_message, Approval, MultisigInfo, SignerKey};
    use crate::permission::{PermissionSet, SignatureRight};
    use ed25519_dalek::SigningKey;

    const POOL_VK: &[u8] = b"pool-vk-v1";

    fn addr(tag: &[u8]) -> Address {
        Address::derive("test", &[tag])
    }

    fn token() -> TokenId {
        TokenId::derive(&addr(b"issuer"))
    }

    fn admin() -> (SigningKey, SignerKey, PermissionSet) {
        let admin = SigningKey::from_bytes(&[1u8; 32]);
        let signer = SignerKey::from_verifying_key(&admin.verifying_key());
        let set = PermissionSet::from_signers([(signer, SignatureRight::ALL)]);
        (admin, signer, set)
    }

    fn deployment() -> DeploymentConfig {
        DeploymentConfig {
            network: Network::Devnet,
            protocol: Some(addr(b"protocol")),
            delegator: None,
            pool_verification_key_hash: compute_hash(POOL_VK),
            factory_verification_key_hash: compute_hash(b"factory-vk"),
            params: ProtocolConfig::default(),
        }
    }

    fn setup() -> (InMemoryLedger, PoolFactory, Pool) {
        let (admin, signer, set) = admin();
        let mut factory = PoolFactory::deploy(addr(b"factory"), &deployment(), set.root()).unwrap();

        let mut ledger = InMemoryLedger::new();
        let pool_address = factory.derive_pool_address(&TokenId::BASE, &token());
        let approval = Approval::sign(
            &admin,
            &deploy_message(&pool_address, &TokenId::BASE, &token()),
            SignatureRight::ALL,
            set.witness(&signer),
        );
        let ctx = ExecutionContext::new(addr(b"deployer"), 1);
        let pool = factory
            .create_pool(&ctx, &mut ledger, pool_address, token(), &[approval])
            .unwrap();

        ledger.fund(addr(b"alice"), TokenId::BASE, 1_000_000).unwrap();
        ledger.fund(addr(b"alice"), token(), 1_000_000).unwrap();
        ledger.fund(addr(b"bob"), TokenId::BASE, 1_000_000).unwrap();
        ledger.fund(addr(b"bob"), token(), 1_000_000).unwrap();
        (ledger, factory, pool)
    }

    fn alice() -> ExecutionContext {
        ExecutionContext::new(addr(b"alice"), 10)
    }

    fn bob() -> ExecutionContext {
        ExecutionContext::new(addr(b"bob"), 10)
    }

    fn seeded() -> (InMemoryLedger, PoolFactory, Pool) {
        let (mut ledger, factory, mut pool) = setup();
        pool.supply_first_liquidity(&alice(), &mut ledger, 1_000, 5_000).unwrap();
        (ledger, factory, pool)
    }

    fn swap_params(amount_in: Amount, balance_in_max: Amount, balance_out_min: Amount) -> SwapParams {
        SwapParams {
            token_in: TokenId::BASE,
            amount_in,
            amount_out_min: 0,
            balance_in_max,
            balance_out_min,
            frontend: None,
            frontend_fee_bps: 0,
        }
    }

    #[test]
    fn test_first_supply_mints_and_locks() {
        let (ledger, _, pool) = seeded();
        let lp = pool.liquidity_token();
        assert_eq!(pool.liquidity_supply(), 6_000);
        assert_eq!(ledger.balance(&addr(b"alice"), &lp), 5_000);
        assert_eq!(ledger.balance(&Address::BURN, &lp), 1_000);
        assert_eq!(pool.reserves(&ledger), (1_000, 5_000));
    }

    #[test]
    fn test_second_first_supply_rejected() {
        let (mut ledger, _, mut pool) = seeded();
        assert_eq!(
            pool.supply_first_liquidity(&alice(), &mut ledger, 1_000, 5_000),
            Err(PoolError::AlreadySupplied)
        );
    }

    #[test]
    fn test_first_supply_zero_amount() {
        let (mut ledger, _, mut pool) = setup();
        assert_eq!(
            pool.supply_first_liquidity(&alice(), &mut ledger, 0, 5_000),
            Err(PoolError::ZeroAmount)
        );
    }

    #[test]
    fn test_swap_regression_fixture() {
        let (mut ledger, _, mut pool) = seeded();
        let mut params = swap_params(100, 1_000, 5_000);
        params.frontend = Some(addr(b"frontend"));
        params.frontend_fee_bps = 5;
        pool.swap(&bob(), &mut ledger, params).unwrap();

        assert_eq!(ledger.balance(&addr(b"bob"), &token()), 1_000_454);
        assert_eq!(pool.reserves(&ledger), (1_100, 4_546));
        assert!(matches!(
            pool.events().last(),
            Some(ContractEvent::Swap(SwapEvent { amount_out: 454, .. }))
        ));
    }

    #[test]
    fn test_swap_pays_fees() {
        let (mut ledger, _, mut pool) = setup();
        pool.supply_first_liquidity(&alice(), &mut ledger, 500_000, 500_000).unwrap();
        let mut params = swap_params(100_000, 500_000, 500_000);
        params.frontend = Some(addr(b"frontend"));
        params.frontend_fee_bps = 10;
        pool.swap(&bob(), &mut ledger, params).unwrap();

        // gross = floor(500_000 * 100_000 / 600_000) = 83_333
        assert_eq!(ledger.balance(&addr(b"frontend"), &token()), 83);
        assert_eq!(ledger.balance(&addr(b"protocol"), &token()), 41);
        assert_eq!(ledger.balance(&addr(b"bob"), &token()), 1_000_000 + 83_333 - 166 - 83 - 41);
    }

    #[test]
    fn test_swap_token_to_base() {
        let (mut ledger, _, mut pool) = seeded();
        let params = SwapParams {
            token_in: token(),
            ..swap_params(500, 5_000, 1_000)
        };
        pool.swap(&bob(), &mut ledger, params).unwrap();
        // floor(1_000 * 500 / 5_500) = 90
        assert_eq!(ledger.balance(&addr(b"bob"), &TokenId::BASE), 1_000_090);
    }

    #[test]
    fn test_swap_slippage_bound() {
        let (mut ledger, _, mut pool) = seeded();
        let mut params = swap_params(100, 1_000, 5_000);
        params.amount_out_min = 455;
        assert_eq!(pool.swap(&bob(), &mut ledger, params), Err(PoolError::InsufficientOutput));
        assert_eq!(pool.reserves(&ledger), (1_000, 5_000));
    }

    #[test]
    fn test_swap_reserve_drift_rejected() {
        let (mut ledger, _, mut pool) = seeded();
        assert_eq!(
            pool.swap(&bob(), &mut ledger, swap_params(100, 999, 5_000)),
            Err(PoolError::InsufficientLiquidity)
        );
        assert_eq!(
            pool.swap(&bob(), &mut ledger, swap_params(100, 1_000, 5_001)),
            Err(PoolError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_swap_frontend_fee_capped() {
        let (mut ledger, _, mut pool) = seeded();
        let mut params = swap_params(100, 1_000, 5_000);
        params.frontend_fee_bps = 11;
        assert_eq!(
            pool.swap(&bob(), &mut ledger, params),
            Err(PoolError::FrontendFeeTooHigh { requested: 11, max: 10 })
        );
    }

    #[test]
    fn test_swap_unknown_token_and_zero_amount() {
        let (mut ledger, _, mut pool) = seeded();
        let stranger = TokenId::derive(&addr(b"stranger"));
        let params = SwapParams {
            token_in: stranger,
            ..swap_params(100, 1_000, 5_000)
        };
        assert_eq!(
            pool.swap(&bob(), &mut ledger, params),
            Err(PoolError::UnknownToken { token: stranger })
        );
        assert_eq!(
            pool.swap(&bob(), &mut ledger, swap_params(0, 1_000, 5_000)),
            Err(PoolError::ZeroAmount)
        );
    }

    #[test]
    fn test_swap_before_supply() {
        let (mut ledger, _, mut pool) = setup();
        assert_eq!(
            pool.swap(&bob(), &mut ledger, swap_params(100, 0, 0)),
            Err(PoolError::NotSupplied)
        );
    }

    #[test]
    fn test_swap_without_funds_leaves_no_trace() {
        let (mut ledger, _, mut pool) = seeded();
        let ctx = ExecutionContext::new(addr(b"pauper"), 10);
        assert!(matches!(
            pool.swap(&ctx, &mut ledger, swap_params(100, 1_000, 5_000)),
            Err(PoolError::Ledger(_))
        ));
        assert_eq!(pool.reserves(&ledger), (1_000, 5_000));
        assert_eq!(pool.events().len(), 1);
    }

    #[test]
    fn test_supply_liquidity_proportional() {
        let (mut ledger, _, mut pool) = seeded();
        let params = SupplyParams {
            amount0: 100,
            amount1: 500,
            reserve0_max: 1_000,
            reserve1_max: 5_000,
            supply_min: 6_000,
        };
        pool.supply_liquidity(&bob(), &mut ledger, params).unwrap();
        assert_eq!(ledger.balance(&addr(b"bob"), &pool.liquidity_token()), 600);
        assert_eq!(pool.liquidity_supply(), 6_600);
    }

    #[test]
    fn test_supply_liquidity_bounds() {
        let (mut ledger, _, mut pool) = seeded();
        let params = SupplyParams {
            amount0: 100,
            amount1: 500,
            reserve0_max: 1_000,
            reserve1_max: 5_000,
            supply_min: 6_001,
        };
        assert_eq!(
            pool.supply_liquidity(&bob(), &mut ledger, params),
            Err(PoolError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_withdraw_round_trip() {
        let (mut ledger, _, mut pool) = seeded();
        let params = WithdrawParams {
            liquidity: 5_000,
            amount0_min: 0,
            amount1_min: 0,
            reserve0_min: 1_000,
            reserve1_min: 5_000,
            supply_max: 6_000,
        };
        pool.withdraw_liquidity(&alice(), &mut ledger, params).unwrap();

        // floor(1_000 * 5_000 / 6_000) = 833, floor(5_000 * 5_000 / 6_000) = 4_166
        assert_eq!(ledger.balance(&addr(b"alice"), &TokenId::BASE), 1_000_000 - 1_000 + 833);
        assert_eq!(ledger.balance(&addr(b"alice"), &token()), 1_000_000 - 5_000 + 4_166);
        assert_eq!(pool.liquidity_supply(), 1_000);
        assert_eq!(ledger.balance(&addr(b"alice"), &pool.liquidity_token()), 0);
    }

    #[test]
    fn test_withdraw_more_than_owned() {
        let (mut ledger, _, mut pool) = seeded();
        let params = WithdrawParams {
            liquidity: 5_001,
            amount0_min: 0,
            amount1_min: 0,
            reserve0_min: 1_000,
            reserve1_min: 5_000,
            supply_max: 6_000,
        };
        assert!(matches!(
            pool.withdraw_liquidity(&alice(), &mut ledger, params),
            Err(PoolError::Ledger(_))
        ));
        assert_eq!(pool.reserves(&ledger), (1_000, 5_000));
        assert_eq!(pool.liquidity_supply(), 6_000);
    }

    #[test]
    fn test_withdraw_slippage() {
        let (mut ledger, _, mut pool) = seeded();
        let params = WithdrawParams {
            liquidity: 5_000,
            amount0_min: 834,
            amount1_min: 0,
            reserve0_min: 1_000,
            reserve1_min: 5_000,
            supply_max: 6_000,
        };
        assert_eq!(
            pool.withdraw_liquidity(&alice(), &mut ledger, params),
            Err(PoolError::InsufficientOutput)
        );
    }

    #[test]
    fn test_sync_protocol_from_factory() {
        let (mut ledger, mut factory, mut pool) = setup();
        let (admin, signer, set) = admin();
        let info = MultisigInfo::new(
            UpdateTarget::Protocol,
            address_value(Some(&addr(b"protocol"))),
            address_value(Some(&addr(b"new-protocol"))),
            100,
        );
        let approval = Approval::sign(&admin, &info.message_hash(), SignatureRight::ALL, set.witness(&signer));
        factory.set_new_protocol(&alice(), &mut ledger, &info, &[approval]).unwrap();

        // pools only pick up the change when synced
        assert_eq!(pool.protocol(), Some(addr(b"protocol")));
        pool.set_protocol(&factory).unwrap();
        assert_eq!(pool.protocol(), Some(addr(b"new-protocol")));
    }

    #[test]
    fn test_sync_from_foreign_factory() {
        let (_, _, mut pool) = setup();
        let (_, _, set) = admin();
        let other = PoolFactory::deploy(addr(b"other-factory"), &deployment(), set.root()).unwrap();
        assert_eq!(
            pool.set_delegator(&other),
            Err(PoolError::FactoryMismatch {
                actual: addr(b"other-factory")
            })
        );
    }

    #[test]
    fn test_verification_key_must_be_approved() {
        let (_, factory, mut pool) = setup();
        assert_eq!(
            pool.update_verification_key(&factory, b"rogue-vk"),
            Err(PoolError::VerificationKeyMismatch)
        );
        pool.update_verification_key(&factory, POOL_VK).unwrap();
        assert_eq!(*pool.verification_key_hash(), compute_hash(POOL_VK));
    }

    #[test]
    fn test_quote_matches_swap() {
        let (mut ledger, _, mut pool) = seeded();
        let quote = pool.quote(&ledger, &TokenId::BASE, 100, 0).unwrap();
        pool.swap(&bob(), &mut ledger, swap_params(100, 1_000, 5_000)).unwrap();
        assert_eq!(ledger.balance(&addr(b"bob"), &token()), 1_000_000 + quote.amount_out());
    }
}
