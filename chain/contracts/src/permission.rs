//! Permission set: who may perform which administrative action
//!
//! Each approved signer owns one leaf of a [`MerkleMap`]: the key is the hash
//! of the signer's public key, the value is the hash of its
//! [`SignatureRight`] bitset. Only the root is stored by the factory; the
//! full set lives off-chain in [`PermissionSet`], which is rebuilt and
//! re-rooted as a whole whenever signers change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use types::ids::domain_hash;

use crate::merkle::{MerkleMap, MerkleWitness};
use crate::multisig::SignerKey;

/// A single administrative capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Right {
    DeployPool = 0,
    UpdateSigner = 1,
    UpdateProtocol = 2,
    UpdateDelegator = 3,
    UpgradeVerificationKey = 4,
    SwapAdminOverride = 5,
}

impl Right {
    pub const ALL: [Right; 6] = [
        Right::DeployPool,
        Right::UpdateSigner,
        Right::UpdateProtocol,
        Right::UpdateDelegator,
        Right::UpgradeVerificationKey,
        Right::SwapAdminOverride,
    ];

    fn mask(self) -> u8 {
        1 << (self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Right::DeployPool => "deploy-pool",
            Right::UpdateSigner => "update-signer",
            Right::UpdateProtocol => "update-protocol",
            Right::UpdateDelegator => "update-delegator",
            Right::UpgradeVerificationKey => "upgrade-verification-key",
            Right::SwapAdminOverride => "swap-admin-override",
        }
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-width bitset of the six [`Right`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureRight {
    bits: u8,
}

impl SignatureRight {
    const VALID_MASK: u8 = 0b0011_1111;

    /// No capabilities.
    pub const NONE: SignatureRight = SignatureRight { bits: 0 };

    /// Every capability.
    pub const ALL: SignatureRight = SignatureRight {
        bits: Self::VALID_MASK,
    };

    pub fn new(rights: &[Right]) -> Self {
        rights.iter().fold(Self::NONE, |acc, r| acc.with(*r))
    }

    /// Build from raw bits, rejecting bits outside the six defined rights.
    pub fn from_bits(bits: u8) -> Option<Self> {
        ((bits & !Self::VALID_MASK) == 0).then_some(Self { bits })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn with(self, right: Right) -> Self {
        Self {
            bits: self.bits | right.mask(),
        }
    }

    pub fn has(&self, right: Right) -> bool {
        (self.bits & right.mask()) != 0
    }

    /// Leaf value committed in the permission map.
    pub fn hash(&self) -> [u8; 32] {
        domain_hash("signature-right", &[&[self.bits]])
    }
}

/// One entry in the permission set's append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionVersion {
    pub version: u64,
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    /// Signer whose leaf changed (`None` for the initial empty version).
    pub signer: Option<SignerKey>,
}

/// Off-chain signer table and the authenticated map derived from it.
#[derive(Debug, Clone)]
pub struct PermissionSet {
    map: MerkleMap,
    signers: BTreeMap<SignerKey, SignatureRight>,
    history: Vec<PermissionVersion>,
}

impl PermissionSet {
    pub fn new() -> Self {
        let map = MerkleMap::new();
        let history = vec![PermissionVersion {
            version: 0,
            root: map.root(),
            signer: None,
        }];
        Self {
            map,
            signers: BTreeMap::new(),
            history,
        }
    }

    pub fn from_signers(entries: impl IntoIterator<Item = (SignerKey, SignatureRight)>) -> Self {
        let mut set = Self::new();
        for (signer, right) in entries {
            set.set_right(signer, right);
        }
        set
    }

    /// Map key for a signer.
    pub fn leaf_key(signer: &SignerKey) -> [u8; 32] {
        domain_hash("signer", &[signer.as_bytes()])
    }

    /// Grant (or replace) a signer's rights. Returns the new root.
    pub fn set_right(&mut self, signer: SignerKey, right: SignatureRight) -> [u8; 32] {
        self.map.set(Self::leaf_key(&signer), right.hash());
        self.signers.insert(signer, right);
        self.record(signer)
    }

    /// Remove a signer entirely. Returns the new root.
    pub fn remove(&mut self, signer: &SignerKey) -> [u8; 32] {
        self.map.set(Self::leaf_key(signer), crate::merkle::EMPTY_LEAF);
        self.signers.remove(signer);
        self.record(*signer)
    }

    fn record(&mut self, signer: SignerKey) -> [u8; 32] {
        let root = self.map.root();
        self.history.push(PermissionVersion {
            version: self.history.len() as u64,
            root,
            signer: Some(signer),
        });
        root
    }

    pub fn right_of(&self, signer: &SignerKey) -> Option<SignatureRight> {
        self.signers.get(signer).copied()
    }

    pub fn root(&self) -> [u8; 32] {
        self.map.root()
    }

    /// Inclusion witness for a signer's leaf.
    pub fn witness(&self, signer: &SignerKey) -> MerkleWitness {
        self.map.witness(&Self::leaf_key(signer))
    }

    pub fn version(&self) -> u64 {
        self.history.last().map_or(0, |v| v.version)
    }

    pub fn history(&self) -> &[PermissionVersion] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::new()
    }
}
