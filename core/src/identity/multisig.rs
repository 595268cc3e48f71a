use bincode::{Decode, Encode};

use super::{IdentityKind, Resolver, Role, TypedIdentity, Verifier};
use crate::error::IdentityError;
use crate::wire;

/// N-of-M escrow identity.
///
/// Satisfied when at least `threshold` of the member `identities` have
/// signed. Members may be any owner identity, including nested escrows.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MultisigIdentity {
    /// Minimum number of valid member signatures required.
    pub threshold: u32,

    /// Serialized member identities.
    pub identities: Vec<Vec<u8>>,
}

/// Signature of a [`MultisigIdentity`]: one slot per member, in member
/// order. Members that did not sign leave their slot empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct MultiSignature {
    pub signatures: Vec<Vec<u8>>,
}

impl MultiSignature {
    pub fn to_bytes(&self) -> Result<Vec<u8>, IdentityError> {
        wire::encode(self).map_err(|e| IdentityError::InvalidSignature(e.to_string()))
    }
}

impl MultisigIdentity {
    pub fn to_identity(&self) -> Result<Vec<u8>, IdentityError> {
        let raw = wire::encode(self).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        TypedIdentity::new(IdentityKind::MultisigEscrow, raw).to_bytes()
    }

    /// A threshold of zero, or above the member count, can never be
    /// meaningfully satisfied.
    fn check_threshold(&self) -> Result<usize, IdentityError> {
        let threshold = self.threshold as usize;
        (threshold > 0 && threshold <= self.identities.len())
            .then_some(threshold)
            .ok_or(IdentityError::InvalidThreshold {
                threshold,
                signers: self.identities.len(),
            })
    }
}

/// Factory for [`IdentityKind::MultisigEscrow`].
pub fn verifier(raw: &[u8], resolver: &Resolver<'_>) -> Result<Box<dyn Verifier>, IdentityError> {
    let identity: MultisigIdentity =
        wire::decode(raw).map_err(|e| IdentityError::Malformed(e.to_string()))?;
    let threshold = identity.check_threshold()?;
    let members = identity
        .identities
        .iter()
        .map(|id| resolver.member(id, Role::Owner))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Box::new(ThresholdVerifier { threshold, members }))
}

struct ThresholdVerifier {
    threshold: usize,
    members: Vec<Box<dyn Verifier>>,
}

impl ThresholdVerifier {
    /// Counts member signatures that verify.
    fn count_satisfied(&self, message: &[u8], signatures: &[Vec<u8>]) -> usize {
        self.members
            .iter()
            .zip(signatures)
            .filter(|(_, sig)| !sig.is_empty())
            .filter_map(|(member, sig)| member.verify(message, sig).ok())
            .count()
    }
}

impl Verifier for ThresholdVerifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
        let multi: MultiSignature = wire::decode(signature)
            .map_err(|e| IdentityError::InvalidSignature(e.to_string()))?;
        if multi.signatures.len() != self.members.len() {
            return Err(IdentityError::InvalidSignature(format!(
                "expected {} signature slots, got {}",
                self.members.len(),
                multi.signatures.len()
            )));
        }

        let satisfied = self.count_satisfied(message, &multi.signatures);
        (satisfied >= self.threshold)
            .then_some(())
            .ok_or(IdentityError::ThresholdNotMet {
                required: self.threshold,
                satisfied,
            })
    }
}
