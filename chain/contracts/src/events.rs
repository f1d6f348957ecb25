//! Contract events
//!
//! Immutable records emitted by successful transitions and consumed by
//! external indexers. A rejected transition emits nothing.

use serde::{Deserialize, Serialize};
use types::ids::{Address, TokenId};
use types::numeric::Amount;

use crate::multisig::{SignerKey, UpdateTarget};

/// A new pool was deployed by the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreationEvent {
    pub sender: Address,
    pub signer: SignerKey,
    pub pool: Address,
    pub token0: TokenId,
    pub token1: TokenId,
}

/// A swap was executed against a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub pool: Address,
    pub sender: Address,
    pub token_in: TokenId,
    pub amount_in: Amount,
    pub amount_out: Amount,
}

/// Direction of a liquidity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityAction {
    Supply,
    Withdraw,
}

/// Liquidity was supplied to or withdrawn from a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEvent {
    pub pool: Address,
    pub sender: Address,
    pub action: LiquidityAction,
    pub amount0: Amount,
    pub amount1: Amount,
    pub liquidity: Amount,
}

/// The approved signer root was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSignerEvent {
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
}

/// A protocol-wide address (fee collector or delegate) changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserEvent {
    pub target: UpdateTarget,
    pub new_address: Option<Address>,
}

/// A verification key hash was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVerificationKeyEvent {
    #[serde(with = "hex::serde")]
    pub hash: [u8; 32],
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    PoolCreation(PoolCreationEvent),
    Swap(SwapEvent),
    Liquidity(LiquidityEvent),
    UpdateSigner(UpdateSignerEvent),
    UpdateUser(UpdateUserEvent),
    UpdateVerificationKey(UpdateVerificationKeyEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_event_serialization() {
        let event = ContractEvent::Swap(SwapEvent {
            pool: Address::derive("test", &[b"pool"]),
            sender: Address::derive("test", &[b"trader"]),
            token_in: TokenId::BASE,
            amount_in: 100,
            amount_out: 454,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_update_signer_root_is_hex() {
        let event = UpdateSignerEvent { root: [0xab; 32] };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(&"ab".repeat(32)));
    }

    #[test]
    fn test_update_user_event_variant() {
        let event = ContractEvent::UpdateUser(UpdateUserEvent {
            target: UpdateTarget::Protocol,
            new_address: None,
        });
        assert!(matches!(event, ContractEvent::UpdateUser(_)));
    }
}
