//! Contract-specific error types
//!
//! Error taxonomy for permission proofs, multisig authorization, ledger
//! application, pool economics and pool creation. Every variant is a hard
//! rejection: the transition that produced it has no effect.

use thiserror::Error;
use types::ids::{Address, TokenId};

/// Authenticated map errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MerkleError {
    #[error("Malformed witness: expected {expected} siblings, got {actual}")]
    MalformedWitness { expected: usize, actual: usize },
}

/// Multisig authorization errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MultisigError {
    #[error("Authorization expired: deadline slot {deadline_slot}, current slot {current_slot}")]
    Expired { deadline_slot: u64, current_slot: u64 },

    #[error("Invalid witness: membership proof does not match the approved signer root")]
    InvalidWitness,

    #[error("Insufficient right: signer lacks {right}")]
    InsufficientRight { right: String },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Stale descriptor: old value does not match current state")]
    StaleDescriptor,

    #[error("Descriptor targets {actual}, expected {expected}")]
    TargetMismatch { expected: String, actual: String },

    #[error("Not enough approvals: required {required}, provided {provided}")]
    NotEnoughApprovals { required: usize, provided: usize },

    #[error("Duplicate signer in approval set")]
    DuplicateSigner,
}

/// Ledger application errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient balance for {owner} in {token}: required {required}, available {available}")]
    InsufficientBalance {
        owner: Address,
        token: TokenId,
        required: u64,
        available: u64,
    },

    #[error("Account already exists: {owner} in {token}")]
    AccountExists { owner: Address, token: TokenId },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Pool errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("Amount must be strictly positive")]
    ZeroAmount,

    #[error("Insufficient output: slippage bound not met")]
    InsufficientOutput,

    #[error("Insufficient liquidity: reserves or supply outside caller bounds")]
    InsufficientLiquidity,

    #[error("Frontend fee {requested} bps exceeds maximum {max} bps")]
    FrontendFeeTooHigh { requested: u64, max: u64 },

    #[error("Pool already has liquidity")]
    AlreadySupplied,

    #[error("Pool has no liquidity yet")]
    NotSupplied,

    #[error("Token {token} is not part of this pool")]
    UnknownToken { token: TokenId },

    #[error("Verification key does not match the factory's approved hash")]
    VerificationKeyMismatch,

    #[error("Factory {actual} did not create this pool")]
    FactoryMismatch { actual: Address },

    #[error("Arithmetic overflow in pool calculation")]
    Overflow,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Factory errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactoryError {
    #[error("Pool already exists for this pair")]
    DuplicatePool,

    #[error("Token pair is not in canonical order")]
    UnorderedPair,

    #[error("Base asset cannot be paired through this entry point")]
    BaseAssetPair,

    #[error("Pool address must be {expected} for this pair")]
    PoolAddressMismatch { expected: Address },

    #[error("Approved signer list must not be empty")]
    EmptySignerList,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Multisig error: {0}")]
    Multisig(#[from] MultisigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Deployment configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}
