//! Contract logic for permissioned AMM pools
//!
//! Constant-product pools whose creation and governance are gated by a
//! multisig over an authenticated permission map. Contracts validate intents
//! into ledger deltas; an external ledger applies each delta atomically.
//!
//! # Modules
//! - `merkle`: Sparse Merkle map, roots and inclusion witnesses
//! - `permission`: Signer capability bitsets and the permission set
//! - `multisig`: Update descriptors, approvals and their verification
//! - `ledger`: Ledger traits, state deltas and an in-memory ledger
//! - `context` / `contract`: Execution context and the contract interface
//! - `math`: Integer constant-product and liquidity formulas
//! - `quote`: Off-chain swap quotes
//! - `pool`: Per-pair AMM pool
//! - `token_holder`: Reserve-side legs of swaps and withdrawals
//! - `factory`: Pool creation and protocol governance
//! - `config`: Deployment configuration
//! - `events`: Contract events
//! - `errors`: Contract-specific error types

pub mod errors;
pub mod events;
pub mod merkle;
pub mod permission;
pub mod multisig;
pub mod ledger;
pub mod context;
pub mod contract;
pub mod math;
pub mod quote;
pub mod config;
pub mod token_holder;
pub mod pool;
pub mod factory;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
