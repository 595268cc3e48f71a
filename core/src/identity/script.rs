use super::{Resolver, Role, Verifier};
use crate::error::IdentityError;
use crate::htlc::{claim_message, ClaimSignature, HashInfo, Script};

/// Factory for [`IdentityKind::Script`](super::IdentityKind::Script).
///
/// The verifier is pinned to the resolution instant: before the deadline
/// only the recipient can sign (a claim), afterwards only the sender (a
/// reclaim).
pub fn verifier(raw: &[u8], resolver: &Resolver<'_>) -> Result<Box<dyn Verifier>, IdentityError> {
    let script = Script::from_raw(raw)?;
    if resolver.now() < script.deadline {
        Ok(Box::new(ClaimVerifier {
            recipient: resolver.member(&script.recipient, Role::Owner)?,
            hash_info: script.hash_info,
        }))
    } else {
        resolver.member(&script.sender, Role::Owner)
    }
}

struct ClaimVerifier {
    recipient: Box<dyn Verifier>,
    hash_info: HashInfo,
}

impl Verifier for ClaimVerifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
        let claim = ClaimSignature::from_bytes(signature)?;
        if !self.hash_info.verify_preimage(&claim.preimage) {
            return Err(IdentityError::PreimageMismatch);
        }
        self.recipient.verify(
            &claim_message(message, &claim.preimage),
            &claim.recipient_signature,
        )
    }
}
