//! Multisig authorization
//!
//! An administrative action is authorized when enough approved signers each
//! present:
//! - an ed25519 signature over the action's message hash,
//! - the [`SignatureRight`] they claim, and
//! - a [`MerkleWitness`] proving that claim against the approved signer root.
//!
//! Verification is a pure check. Callers apply their state change only after
//! it returns `Ok`.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;
use types::ids::{domain_hash, Address, TokenId};
use types::numeric::Slot;

use crate::errors::MultisigError;
use crate::merkle::MerkleWitness;
use crate::permission::{PermissionSet, Right, SignatureRight};

/// Public identity of an approved signer (ed25519 verifying key bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerKey(#[serde(with = "hex::serde")] [u8; 32]);

impl SignerKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True for the null identity.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Check an ed25519 signature over `message`.
    pub fn verify(&self, message: &[u8; 32], signature: &ApprovalSignature) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let signature = Signature::from_bytes(&signature.0);
        key.verify(message, &signature).is_ok()
    }
}

impl fmt::Display for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Raw ed25519 signature bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalSignature(#[serde(with = "hex::serde")] [u8; 64]);

impl ApprovalSignature {
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Contract field an update descriptor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateTarget {
    /// Approved signer root
    Signer,
    /// Protocol fee collector address
    Protocol,
    /// Delegate address
    Delegator,
    /// Pool verification key hash
    VerificationKey,
}

impl UpdateTarget {
    /// Capability a signer needs to approve this update.
    pub fn required_right(self) -> Right {
        match self {
            UpdateTarget::Signer => Right::UpdateSigner,
            UpdateTarget::Protocol => Right::UpdateProtocol,
            UpdateTarget::Delegator => Right::UpdateDelegator,
            UpdateTarget::VerificationKey => Right::UpgradeVerificationKey,
        }
    }

    fn tag(self) -> u8 {
        match self {
            UpdateTarget::Signer => 0,
            UpdateTarget::Protocol => 1,
            UpdateTarget::Delegator => 2,
            UpdateTarget::VerificationKey => 3,
        }
    }
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateTarget::Signer => "signer",
            UpdateTarget::Protocol => "protocol",
            UpdateTarget::Delegator => "delegator",
            UpdateTarget::VerificationKey => "verification-key",
        };
        f.write_str(name)
    }
}

/// Encode an optional address as a descriptor value (`None` is all zeros).
pub fn address_value(address: Option<&Address>) -> [u8; 32] {
    address.map_or([0u8; 32], |a| *a.as_bytes())
}

/// Decode a descriptor value back into an optional address.
pub fn value_address(value: &[u8; 32]) -> Option<Address> {
    let address = Address::from_bytes(*value);
    (!address.is_empty()).then_some(address)
}

/// Proposed administrative update, signed by approvers.
///
/// `old_value` doubles as an optimistic-concurrency token: once an update
/// commits, every other descriptor still carrying the previous value is
/// rejected as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigInfo {
    pub target: UpdateTarget,
    #[serde(with = "hex::serde")]
    pub old_value: [u8; 32],
    #[serde(with = "hex::serde")]
    pub new_value: [u8; 32],
    pub deadline_slot: Slot,
}

impl MultisigInfo {
    pub fn new(target: UpdateTarget, old_value: [u8; 32], new_value: [u8; 32], deadline_slot: Slot) -> Self {
        Self {
            target,
            old_value,
            new_value,
            deadline_slot,
        }
    }

    /// Hash every approver signs.
    pub fn message_hash(&self) -> [u8; 32] {
        domain_hash(
            "multisig-info",
            &[
                &[self.target.tag()],
                &self.old_value,
                &self.new_value,
                &self.deadline_slot.to_be_bytes(),
            ],
        )
    }
}

/// Message an approver signs to authorize deploying the `(token0, token1)`
/// pool at `pool`.
pub fn deploy_message(pool: &Address, token0: &TokenId, token1: &TokenId) -> [u8; 32] {
    domain_hash("deploy-pool", &[pool.as_bytes(), token0.as_bytes(), token1.as_bytes()])
}

/// One signer's endorsement of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub signer: SignerKey,
    pub signature: ApprovalSignature,
    /// Rights the signer claims; proven by `witness`.
    pub right: SignatureRight,
    pub witness: MerkleWitness,
}

impl Approval {
    /// Sign `message` and attach the signer's permission proof.
    pub fn sign(key: &SigningKey, message: &[u8; 32], right: SignatureRight, witness: MerkleWitness) -> Self {
        Self {
            signer: SignerKey::from_verifying_key(&key.verifying_key()),
            signature: ApprovalSignature(key.sign(message).to_bytes()),
            right,
            witness,
        }
    }
}

/// Checks approvals against an approved signer root.
#[derive(Debug, Clone)]
pub struct MultisigVerifier {
    root: [u8; 32],
    threshold: usize,
}

impl MultisigVerifier {
    /// `threshold` distinct approvals are required; zero is treated as one.
    pub fn new(root: [u8; 32], threshold: usize) -> Self {
        Self {
            root,
            threshold: threshold.max(1),
        }
    }

    pub fn root(&self) -> &[u8; 32] {
        &self.root
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Verify a single approval of `descriptor` for capability `needed`.
    ///
    /// Checks run in order: deadline, membership witness, capability,
    /// signature.
    pub fn verify_action(
        &self,
        current_slot: Slot,
        descriptor: &MultisigInfo,
        approval: &Approval,
        needed: Right,
    ) -> Result<(), MultisigError> {
        check_deadline(descriptor, current_slot)?;
        self.verify_approval(&descriptor.message_hash(), approval, needed)
    }

    /// Verify a quorum of approvals for an update descriptor.
    pub fn verify_descriptor(
        &self,
        current_slot: Slot,
        descriptor: &MultisigInfo,
        approvals: &[Approval],
    ) -> Result<(), MultisigError> {
        check_deadline(descriptor, current_slot)?;
        self.verify_quorum(
            &descriptor.message_hash(),
            approvals,
            descriptor.target.required_right(),
        )
    }

    /// Verify a quorum of approvals binding a deployment to `pool` and its pair.
    pub fn verify_deploy(
        &self,
        pool: &Address,
        token0: &TokenId,
        token1: &TokenId,
        approvals: &[Approval],
    ) -> Result<(), MultisigError> {
        self.verify_quorum(&deploy_message(pool, token0, token1), approvals, Right::DeployPool)
    }

    fn verify_quorum(
        &self,
        message: &[u8; 32],
        approvals: &[Approval],
        needed: Right,
    ) -> Result<(), MultisigError> {
        if approvals.len() < self.threshold {
            return Err(MultisigError::NotEnoughApprovals {
                required: self.threshold,
                provided: approvals.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for approval in approvals {
            if !seen.insert(approval.signer) {
                return Err(MultisigError::DuplicateSigner);
            }
            self.verify_approval(message, approval, needed)?;
        }
        Ok(())
    }

    fn verify_approval(
        &self,
        message: &[u8; 32],
        approval: &Approval,
        needed: Right,
    ) -> Result<(), MultisigError> {
        if approval.signer.is_empty() {
            return Err(MultisigError::InvalidSignature);
        }

        let key = PermissionSet::leaf_key(&approval.signer);
        let root = approval
            .witness
            .compute_root(&key, &approval.right.hash())
            .map_err(|_| MultisigError::InvalidWitness)?;
        if root != self.root {
            warn!(signer = %approval.signer, "Approval witness does not match signer root");
            return Err(MultisigError::InvalidWitness);
        }

        if !approval.right.has(needed) {
            warn!(signer = %approval.signer, right = %needed, "Signer lacks required right");
            return Err(MultisigError::InsufficientRight {
                right: needed.to_string(),
            });
        }

        if !approval.signer.verify(message, &approval.signature) {
            warn!(signer = %approval.signer, "Approval signature rejected");
            return Err(MultisigError::InvalidSignature);
        }

        Ok(())
    }
}

fn check_deadline(descriptor: &MultisigInfo, current_slot: Slot) -> Result<(), MultisigError> {
    if current_slot >= descriptor.deadline_slot {
        return Err(MultisigError::Expired {
            deadline_slot: descriptor.deadline_slot,
            current_slot,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::compute_hash;

    fn key(n: u8) -> SigningKey {
        SigningKey::from_bytes(&[n; 32])
    }

    fn signer_of(k: &SigningKey) -> SignerKey {
        SignerKey::from_verifying_key(&k.verifying_key())
    }

    fn setup() -> (PermissionSet, SigningKey, SigningKey, SigningKey) {
        let admin = key(1);
        let deployer = key(2);
        let nobody = key(3);
        let set = PermissionSet::from_signers([
            (signer_of(&admin), SignatureRight::ALL),
            (signer_of(&deployer), SignatureRight::new(&[Right::DeployPool])),
            (signer_of(&nobody), SignatureRight::NONE),
        ]);
        (set, admin, deployer, nobody)
    }

    fn approve(set: &PermissionSet, k: &SigningKey, message: &[u8; 32]) -> Approval {
        let signer = signer_of(k);
        Approval::sign(k, message, set.right_of(&signer).unwrap(), set.witness(&signer))
    }

    fn descriptor(deadline: Slot) -> MultisigInfo {
        MultisigInfo::new(UpdateTarget::Signer, [1u8; 32], [2u8; 32], deadline)
    }

    #[test]
    fn test_valid_action() {
        let (set, admin, _, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let info = descriptor(100);
        let approval = approve(&set, &admin, &info.message_hash());
        assert_eq!(verifier.verify_action(10, &info, &approval, Right::UpdateSigner), Ok(()));
    }

    #[test]
    fn test_expired_at_deadline() {
        let (set, admin, _, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let info = descriptor(100);
        let approval = approve(&set, &admin, &info.message_hash());
        assert_eq!(
            verifier.verify_action(100, &info, &approval, Right::UpdateSigner),
            Err(MultisigError::Expired {
                deadline_slot: 100,
                current_slot: 100
            })
        );
    }

    #[test]
    fn test_claimed_right_must_match_leaf() {
        let (set, _, deployer, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let info = descriptor(100);
        let mut approval = approve(&set, &deployer, &info.message_hash());
        approval.right = SignatureRight::ALL;
        assert_eq!(
            verifier.verify_action(1, &info, &approval, Right::UpdateSigner),
            Err(MultisigError::InvalidWitness)
        );
    }

    #[test]
    fn test_missing_capability() {
        let (set, _, deployer, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let info = descriptor(100);
        let approval = approve(&set, &deployer, &info.message_hash());
        assert_eq!(
            verifier.verify_action(1, &info, &approval, Right::UpdateSigner),
            Err(MultisigError::InsufficientRight {
                right: "update-signer".to_string()
            })
        );
    }

    #[test]
    fn test_signature_over_other_message() {
        let (set, admin, _, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let info = descriptor(100);
        let approval = approve(&set, &admin, &compute_hash(b"something else"));
        assert_eq!(
            verifier.verify_action(1, &info, &approval, Right::UpdateSigner),
            Err(MultisigError::InvalidSignature)
        );
    }

    #[test]
    fn test_empty_signer_rejected() {
        let (set, admin, _, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let info = descriptor(100);
        let mut approval = approve(&set, &admin, &info.message_hash());
        approval.signer = SignerKey::from_bytes([0u8; 32]);
        assert_eq!(
            verifier.verify_action(1, &info, &approval, Right::UpdateSigner),
            Err(MultisigError::InvalidSignature)
        );
    }

    #[test]
    fn test_quorum_requires_distinct_signers() {
        let (set, admin, _, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 2);
        let info = descriptor(100);
        let approval = approve(&set, &admin, &info.message_hash());
        assert_eq!(
            verifier.verify_descriptor(1, &info, &[approval.clone()]),
            Err(MultisigError::NotEnoughApprovals {
                required: 2,
                provided: 1
            })
        );
        assert_eq!(
            verifier.verify_descriptor(1, &info, &[approval.clone(), approval]),
            Err(MultisigError::DuplicateSigner)
        );
    }

    #[test]
    fn test_quorum_fails_on_any_bad_approval() {
        let (set, admin, _, nobody) = setup();
        let verifier = MultisigVerifier::new(set.root(), 2);
        let info = descriptor(100);
        let approvals = [
            approve(&set, &admin, &info.message_hash()),
            approve(&set, &nobody, &info.message_hash()),
        ];
        assert!(matches!(
            verifier.verify_descriptor(1, &info, &approvals),
            Err(MultisigError::InsufficientRight { .. })
        ));
    }

    #[test]
    fn test_deploy_binds_pool_address() {
        let (set, _, deployer, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let pool = Address::derive("test", &[b"pool-a"]);
        let other = Address::derive("test", &[b"pool-b"]);
        let token = TokenId::derive(&Address::derive("test", &[b"issuer"]));
        let approval = approve(&set, &deployer, &deploy_message(&pool, &TokenId::BASE, &token));

        assert_eq!(
            verifier.verify_deploy(&pool, &TokenId::BASE, &token, &[approval.clone()]),
            Ok(())
        );
        assert_eq!(
            verifier.verify_deploy(&other, &TokenId::BASE, &token, &[approval]),
            Err(MultisigError::InvalidSignature)
        );
    }

    #[test]
    fn test_deploy_binds_pair() {
        let (set, _, deployer, _) = setup();
        let verifier = MultisigVerifier::new(set.root(), 1);
        let pool = Address::derive("test", &[b"pool-a"]);
        let token_a = TokenId::derive(&Address::derive("test", &[b"issuer-a"]));
        let token_b = TokenId::derive(&Address::derive("test", &[b"issuer-b"]));
        let approval = approve(&set, &deployer, &deploy_message(&pool, &TokenId::BASE, &token_a));

        assert_eq!(
            verifier.verify_deploy(&pool, &TokenId::BASE, &token_b, &[approval]),
            Err(MultisigError::InvalidSignature)
        );
    }

    #[test]
    fn test_message_hash_covers_every_field() {
        let base = descriptor(100);
        let mut later = base.clone();
        later.deadline_slot = 101;
        let mut other_target = base.clone();
        other_target.target = UpdateTarget::Protocol;
        assert_ne!(base.message_hash(), later.message_hash());
        assert_ne!(base.message_hash(), other_target.message_hash());
    }

    #[test]
    fn test_address_value_round_trip() {
        let addr = Address::derive("test", &[b"collector"]);
        assert_eq!(value_address(&address_value(Some(&addr))), Some(addr));
        assert_eq!(value_address(&address_value(None)), None);
    }
}
