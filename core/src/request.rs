//! The token request envelope and signature correlation.

use std::cell::Cell;

use bincode::{Decode, Encode};
use tracing::trace;

use crate::error::ValidationError;
use crate::identity::Verifier;
use crate::{wire, Result};

/// A transaction request: serialized actions plus the signatures over them.
///
/// Signatures appear in the order the validator asks for them: each issue
/// action's issuer, then for each transfer action the owner of every input
/// followed by the issuer when the transfer is a redeem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct TokenRequest {
    pub issues: Vec<Vec<u8>>,
    pub transfers: Vec<Vec<u8>>,
    pub signatures: Vec<Vec<u8>>,
    pub auditor_signatures: Vec<Vec<u8>>,
}

impl TokenRequest {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        wire::encode(self).map_err(|e| ValidationError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        wire::decode(bytes).map_err(|e| ValidationError::MalformedRequest(e.to_string()))
    }

    /// The payload every party signs: the encoded actions followed by the
    /// transaction id.
    pub fn message_to_sign(&self, tx_id: &str) -> Result<Vec<u8>> {
        let mut message = wire::encode(&(&self.issues, &self.transfers))
            .map_err(|e| ValidationError::Encoding(e.to_string()))?;
        message.extend_from_slice(tx_id.as_bytes());
        Ok(message)
    }
}

/// Proves that an identity signed the request under validation.
pub trait SignatureProvider {
    /// Returns the signature by `identity`, checked with `verifier`.
    fn has_been_signed_by(&self, identity: &[u8], verifier: &dyn Verifier) -> Result<Vec<u8>>;
}

/// [`SignatureProvider`] over the signatures carried in a [`TokenRequest`].
///
/// Signatures are consumed in order, one per call.
#[derive(Debug)]
pub struct SignatureBackend<'a> {
    message: Vec<u8>,
    signatures: &'a [Vec<u8>],
    cursor: Cell<usize>,
}

impl<'a> SignatureBackend<'a> {
    pub fn new(message: Vec<u8>, signatures: &'a [Vec<u8>]) -> Self {
        Self {
            message,
            signatures,
            cursor: Cell::new(0),
        }
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Number of signatures not consumed yet.
    pub fn remaining(&self) -> usize {
        self.signatures.len().saturating_sub(self.cursor.get())
    }
}

impl SignatureProvider for SignatureBackend<'_> {
    fn has_been_signed_by(&self, identity: &[u8], verifier: &dyn Verifier) -> Result<Vec<u8>> {
        let index = self.cursor.get();
        let signature = self.signatures.get(index).ok_or_else(|| {
            ValidationError::SignatureVerificationFailed(format!("signature {index} is missing"))
        })?;
        self.cursor.set(index + 1);

        verifier.verify(&self.message, signature).map_err(|e| {
            ValidationError::SignatureVerificationFailed(format!(
                "signature {index} by {}: {e}",
                hex::encode(identity)
            ))
        })?;
        trace!(index, "signature verified");
        Ok(signature.clone())
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    use super::*;
    use crate::identity::certificate::Certificate;

    #[test]
    fn bytes_roundtrip() {
        let request = TokenRequest {
            issues: vec![vec![1, 2]],
            transfers: vec![vec![3]],
            signatures: vec![vec![4; 64]],
            auditor_signatures: vec![],
        };
        let bytes = request.to_bytes().unwrap();
        assert_eq!(TokenRequest::from_bytes(&bytes).unwrap(), request);
        assert!(matches!(
            TokenRequest::from_bytes(&bytes[1..]),
            Err(ValidationError::MalformedRequest(_))
        ));
    }

    #[test]
    fn message_binds_actions_and_tx_id() {
        let request = TokenRequest {
            issues: vec![vec![1]],
            ..Default::default()
        };
        let a = request.message_to_sign("tx1").unwrap();
        assert_ne!(a, request.message_to_sign("tx2").unwrap());

        // signatures are not part of the payload
        let signed = TokenRequest {
            signatures: vec![vec![9]],
            ..request.clone()
        };
        assert_eq!(a, signed.message_to_sign("tx1").unwrap());
    }

    #[test]
    fn backend_consumes_in_order() {
        let alice = SigningKey::generate(&mut OsRng);
        let bob = SigningKey::generate(&mut OsRng);
        let alice_v = Certificate::ed25519(&alice.verifying_key()).verifier().unwrap();
        let bob_v = Certificate::ed25519(&bob.verifying_key()).verifier().unwrap();

        let message = b"payload".to_vec();
        let signatures = vec![
            alice.sign(&message).to_bytes().to_vec(),
            bob.sign(&message).to_bytes().to_vec(),
        ];

        let backend = SignatureBackend::new(message.clone(), &signatures);
        assert_eq!(backend.has_been_signed_by(b"alice", alice_v.as_ref()).unwrap(), signatures[0]);
        assert_eq!(backend.has_been_signed_by(b"bob", bob_v.as_ref()).unwrap(), signatures[1]);
        assert_eq!(backend.remaining(), 0);
        assert!(matches!(
            backend.has_been_signed_by(b"alice", alice_v.as_ref()),
            Err(ValidationError::SignatureVerificationFailed(_))
        ));

        // out of order
        let backend = SignatureBackend::new(message, &signatures);
        assert!(backend.has_been_signed_by(b"bob", bob_v.as_ref()).is_err());
    }
}
