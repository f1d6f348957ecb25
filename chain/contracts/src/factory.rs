//! Pool factory: permissioned pool creation and protocol governance
//!
//! The factory owns the approved signer root and the protocol-wide addresses.
//! It enforces at most one pool per pair, canonical ordering of token/token
//! pairs, and multisig approval for every deployment and administrative
//! update.
//!
//! Every pool lives at an address derived from the factory and its ordered
//! pair, so a pair has exactly one possible pool and no two pairs share one.
//!
//! Pair existence is recorded twice: in the factory's registry, and as one
//! unit of the factory's own token minted to a per-pair flag account on the
//! ledger. Either one is enough to reject a second pool for the pair.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use types::ids::{Address, TokenId};

use crate::config::{DeploymentConfig, Network, ProtocolConfig};
use crate::context::ExecutionContext;
use crate::contract::{Contract, Transition};
use crate::errors::{FactoryError, MultisigError};
use crate::events::{
    ContractEvent, PoolCreationEvent, UpdateSignerEvent, UpdateUserEvent, UpdateVerificationKeyEvent,
};
use crate::ledger::{Ledger, LedgerView, StateDelta};
use crate::merkle::empty_root;
use crate::multisig::{address_value, value_address, Approval, MultisigInfo, MultisigVerifier, UpdateTarget};
use crate::pool::Pool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryIntent {
    /// Base-asset pool for `token`; `pool` must be the derived pool address
    CreatePool {
        pool: Address,
        token: TokenId,
        approvals: Vec<Approval>,
    },
    /// Token/token pool; `token_a` must sort below `token_b`
    CreatePoolToken {
        pool: Address,
        token_a: TokenId,
        token_b: TokenId,
        approvals: Vec<Approval>,
    },
    UpdateApprovedSigner {
        descriptor: MultisigInfo,
        approvals: Vec<Approval>,
    },
    SetNewProtocol {
        descriptor: MultisigInfo,
        approvals: Vec<Approval>,
    },
    SetNewDelegator {
        descriptor: MultisigInfo,
        approvals: Vec<Approval>,
    },
    UpdateVerificationKey {
        descriptor: MultisigInfo,
        approvals: Vec<Approval>,
    },
}

/// Factory state written by a committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryUpdate {
    PoolCreated {
        pool: Address,
        token0: TokenId,
        token1: TokenId,
    },
    ApprovedSigner([u8; 32]),
    Protocol(Option<Address>),
    Delegator(Option<Address>),
    PoolVerificationKey([u8; 32]),
}

#[derive(Debug, Clone)]
pub struct PoolFactory {
    address: Address,
    network: Network,
    config: ProtocolConfig,
    /// Root of the permission map
    approved_signer: [u8; 32],
    protocol: Option<Address>,
    delegator: Option<Address>,
    pool_verification_key_hash: [u8; 32],
    factory_verification_key_hash: [u8; 32],
    /// (token0, token1) -> pool address
    pools: BTreeMap<(TokenId, TokenId), Address>,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl PoolFactory {
    /// Deploy a factory at `address` with an initial approved signer root.
    pub fn deploy(
        address: Address,
        deployment: &DeploymentConfig,
        approved_signer: [u8; 32],
    ) -> Result<Self, FactoryError> {
        deployment.validate()?;
        if approved_signer == empty_root() {
            return Err(FactoryError::EmptySignerList);
        }
        info!(
            factory = %address,
            network = %deployment.network,
            root = %hex::encode(approved_signer),
            "Pool factory deployed"
        );
        Ok(Self {
            address,
            network: deployment.network,
            config: deployment.params,
            approved_signer,
            protocol: deployment.protocol,
            delegator: deployment.delegator,
            pool_verification_key_hash: deployment.pool_verification_key_hash,
            factory_verification_key_hash: deployment.factory_verification_key_hash,
            pools: BTreeMap::new(),
            events: Vec::new(),
        })
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn approved_signer(&self) -> &[u8; 32] {
        &self.approved_signer
    }

    pub fn protocol(&self) -> Option<Address> {
        self.protocol
    }

    pub fn delegator(&self) -> Option<Address> {
        self.delegator
    }

    pub fn pool_verification_key_hash(&self) -> &[u8; 32] {
        &self.pool_verification_key_hash
    }

    pub fn factory_verification_key_hash(&self) -> &[u8; 32] {
        &self.factory_verification_key_hash
    }

    /// Token minted to pair flag accounts.
    pub fn factory_token(&self) -> TokenId {
        TokenId::derive(&self.address)
    }

    /// Flag account recording that a pool exists for `(token0, token1)`.
    pub fn pair_address(&self, token0: &TokenId, token1: &TokenId) -> Address {
        Address::derive("pair", &[self.address.as_bytes(), token0.as_bytes(), token1.as_bytes()])
    }

    /// The only address a pool for `(token0, token1)` can be created at.
    pub fn derive_pool_address(&self, token0: &TokenId, token1: &TokenId) -> Address {
        Address::derive("pool", &[self.address.as_bytes(), token0.as_bytes(), token1.as_bytes()])
    }

    /// Address of the pool for an ordered pair, if one was created.
    pub fn pool_address(&self, token0: &TokenId, token1: &TokenId) -> Option<Address> {
        self.pools.get(&(*token0, *token1)).copied()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    fn verifier(&self) -> MultisigVerifier {
        MultisigVerifier::new(self.approved_signer, self.config.approval_threshold)
    }

    // ───────────────────────── Pool Creation ─────────────────────────

    /// Create the base-asset pool for `token` at `pool`.
    pub fn create_pool<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        pool: Address,
        token: TokenId,
        approvals: &[Approval],
    ) -> Result<Pool, FactoryError> {
        let intent = FactoryIntent::CreatePool {
            pool,
            token,
            approvals: approvals.to_vec(),
        };
        self.execute(ctx, ledger, &intent)?;
        Ok(Pool::from_factory(pool, TokenId::BASE, token, self))
    }

    /// Create the pool for `token_a`/`token_b` at `pool`.
    pub fn create_pool_token<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        pool: Address,
        token_a: TokenId,
        token_b: TokenId,
        approvals: &[Approval],
    ) -> Result<Pool, FactoryError> {
        let intent = FactoryIntent::CreatePoolToken {
            pool,
            token_a,
            token_b,
            approvals: approvals.to_vec(),
        };
        self.execute(ctx, ledger, &intent)?;
        Ok(Pool::from_factory(pool, token_a, token_b, self))
    }

    fn validate_create(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        pool: Address,
        token0: TokenId,
        token1: TokenId,
        approvals: &[Approval],
    ) -> Result<Transition<FactoryUpdate>, FactoryError> {
        let expected = self.derive_pool_address(&token0, &token1);
        if pool != expected {
            return Err(FactoryError::PoolAddressMismatch { expected });
        }
        let flag = self.pair_address(&token0, &token1);
        let factory_token = self.factory_token();
        if self.pools.contains_key(&(token0, token1))
            || ledger.balance(&flag, &factory_token) != 0
            || ledger.account_exists(&pool, &token0)
            || ledger.account_exists(&pool, &token1)
        {
            return Err(FactoryError::DuplicatePool);
        }

        self.verifier().verify_deploy(&pool, &token0, &token1, approvals)?;
        let signer = approvals
            .first()
            .map(|a| a.signer)
            .ok_or(MultisigError::NotEnoughApprovals {
                required: self.config.approval_threshold,
                provided: 0,
            })?;

        let mut delta = StateDelta::new();
        delta
            .create_account(pool, token0)
            .create_account(pool, token1)
            .mint(flag, factory_token, 1);

        let event = PoolCreationEvent {
            sender: ctx.sender,
            signer,
            pool,
            token0,
            token1,
        };
        Ok(
            Transition::new(delta, FactoryUpdate::PoolCreated { pool, token0, token1 })
                .with_event(ContractEvent::PoolCreation(event)),
        )
    }

    // ───────────────────────── Governance ─────────────────────────

    pub fn update_approved_signer<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<(), FactoryError> {
        let intent = FactoryIntent::UpdateApprovedSigner {
            descriptor: descriptor.clone(),
            approvals: approvals.to_vec(),
        };
        self.execute(ctx, ledger, &intent)
    }

    pub fn set_new_protocol<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<(), FactoryError> {
        let intent = FactoryIntent::SetNewProtocol {
            descriptor: descriptor.clone(),
            approvals: approvals.to_vec(),
        };
        self.execute(ctx, ledger, &intent)
    }

    pub fn set_new_delegator<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<(), FactoryError> {
        let intent = FactoryIntent::SetNewDelegator {
            descriptor: descriptor.clone(),
            approvals: approvals.to_vec(),
        };
        self.execute(ctx, ledger, &intent)
    }

    /// Approve a new pool verification key hash; pools adopt it themselves.
    pub fn update_verification_key<L: Ledger>(
        &mut self,
        ctx: &ExecutionContext,
        ledger: &mut L,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<(), FactoryError> {
        let intent = FactoryIntent::UpdateVerificationKey {
            descriptor: descriptor.clone(),
            approvals: approvals.to_vec(),
        };
        self.execute(ctx, ledger, &intent)
    }

    /// Current value of the field an update targets, in descriptor encoding.
    pub fn current_value(&self, target: UpdateTarget) -> [u8; 32] {
        match target {
            UpdateTarget::Signer => self.approved_signer,
            UpdateTarget::Protocol => address_value(self.protocol.as_ref()),
            UpdateTarget::Delegator => address_value(self.delegator.as_ref()),
            UpdateTarget::VerificationKey => self.pool_verification_key_hash,
        }
    }

    fn authorize_update(
        &self,
        ctx: &ExecutionContext,
        expected: UpdateTarget,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<(), FactoryError> {
        if descriptor.target != expected {
            return Err(MultisigError::TargetMismatch {
                expected: expected.to_string(),
                actual: descriptor.target.to_string(),
            }
            .into());
        }
        if descriptor.old_value != self.current_value(expected) {
            return Err(MultisigError::StaleDescriptor.into());
        }
        self.verifier()
            .verify_descriptor(ctx.current_slot, descriptor, approvals)?;
        Ok(())
    }

    fn validate_update(
        &self,
        ctx: &ExecutionContext,
        expected: UpdateTarget,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<Transition<FactoryUpdate>, FactoryError> {
        if expected == UpdateTarget::Signer && descriptor.new_value == empty_root() {
            return Err(FactoryError::EmptySignerList);
        }
        self.authorize_update(ctx, expected, descriptor, approvals)?;

        let new_value = descriptor.new_value;
        let (update, event) = match expected {
            UpdateTarget::Signer => (
                FactoryUpdate::ApprovedSigner(new_value),
                ContractEvent::UpdateSigner(UpdateSignerEvent { root: new_value }),
            ),
            UpdateTarget::Protocol => {
                let new_address = value_address(&new_value);
                (
                    FactoryUpdate::Protocol(new_address),
                    ContractEvent::UpdateUser(UpdateUserEvent {
                        target: expected,
                        new_address,
                    }),
                )
            }
            UpdateTarget::Delegator => {
                let new_address = value_address(&new_value);
                (
                    FactoryUpdate::Delegator(new_address),
                    ContractEvent::UpdateUser(UpdateUserEvent {
                        target: expected,
                        new_address,
                    }),
                )
            }
            UpdateTarget::VerificationKey => (
                FactoryUpdate::PoolVerificationKey(new_value),
                ContractEvent::UpdateVerificationKey(UpdateVerificationKeyEvent { hash: new_value }),
            ),
        };
        Ok(Transition::new(StateDelta::new(), update).with_event(event))
    }
}

impl Contract for PoolFactory {
    type Intent = FactoryIntent;
    type Update = FactoryUpdate;
    type Error = FactoryError;

    fn validate(
        &self,
        ctx: &ExecutionContext,
        ledger: &dyn LedgerView,
        intent: &FactoryIntent,
    ) -> Result<Transition<FactoryUpdate>, FactoryError> {
        match intent {
            FactoryIntent::CreatePool { pool, token, approvals } => {
                if token.is_base() {
                    return Err(FactoryError::BaseAssetPair);
                }
                self.validate_create(ctx, ledger, *pool, TokenId::BASE, *token, approvals)
            }
            FactoryIntent::CreatePoolToken {
                pool,
                token_a,
                token_b,
                approvals,
            } => {
                if token_a >= token_b {
                    return Err(FactoryError::UnorderedPair);
                }
                if token_a.is_base() {
                    return Err(FactoryError::BaseAssetPair);
                }
                self.validate_create(ctx, ledger, *pool, *token_a, *token_b, approvals)
            }
            FactoryIntent::UpdateApprovedSigner { descriptor, approvals } => {
                self.validate_update(ctx, UpdateTarget::Signer, descriptor, approvals)
            }
            FactoryIntent::SetNewProtocol { descriptor, approvals } => {
                self.validate_update(ctx, UpdateTarget::Protocol, descriptor, approvals)
            }
            FactoryIntent::SetNewDelegator { descriptor, approvals } => {
                self.validate_update(ctx, UpdateTarget::Delegator, descriptor, approvals)
            }
            FactoryIntent::UpdateVerificationKey { descriptor, approvals } => {
                self.validate_update(ctx, UpdateTarget::VerificationKey, descriptor, approvals)
            }
        }
    }

    fn commit(&mut self, update: FactoryUpdate, events: Vec<ContractEvent>) {
        match update {
            FactoryUpdate::PoolCreated { pool, token0, token1 } => {
                self.pools.insert((token0, token1), pool);
                info!(factory = %self.address, %pool, %token0, %token1, "Pool created");
            }
            FactoryUpdate::ApprovedSigner(root) => {
                self.approved_signer = root;
                info!(factory = %self.address, root = %hex::encode(root), "Approved signer root updated");
            }
            FactoryUpdate::Protocol(address) => {
                self.protocol = address;
                info!(factory = %self.address, protocol = ?address, "Protocol address updated");
            }
            FactoryUpdate::Delegator(address) => {
                self.delegator = address;
                info!(factory = %self.address, delegator = ?address, "Delegator updated");
            }
            FactoryUpdate::PoolVerificationKey(hash) => {
                self.pool_verification_key_hash = hash;
                info!(factory = %self.address, hash = %hex::encode(hash), "Pool verification key hash updated");
            }
        }
        self.events.extend(events);
    }
}
