use bincode::{Decode, Encode};
use ed25519_dalek::Verifier as _;

use super::{IdentityKind, Resolver, TypedIdentity, Verifier};
use crate::error::IdentityError;
use crate::wire;

/// Signature scheme of a certificate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum SignatureScheme {
    /// 32-byte Ed25519 public key, 64-byte signatures.
    Ed25519,
    /// SEC1-encoded secp256k1 public key, DER-encoded ECDSA signatures.
    Secp256k1,
}

/// A pseudonymous identity backed by a long-lived public key.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Certificate {
    pub scheme: SignatureScheme,
    pub public_key: Vec<u8>,
}

impl Certificate {
    pub fn ed25519(key: &ed25519_dalek::VerifyingKey) -> Self {
        Self {
            scheme: SignatureScheme::Ed25519,
            public_key: key.to_bytes().to_vec(),
        }
    }

    pub fn secp256k1(key: &k256::ecdsa::VerifyingKey) -> Self {
        Self {
            scheme: SignatureScheme::Secp256k1,
            public_key: key.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Serializes as a typed certificate identity.
    pub fn to_identity(&self) -> Result<Vec<u8>, IdentityError> {
        let raw = wire::encode(self).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        TypedIdentity::new(IdentityKind::Certificate, raw).to_bytes()
    }

    /// Decodes the public key into a verifier.
    pub fn verifier(&self) -> Result<Box<dyn Verifier>, IdentityError> {
        match self.scheme {
            SignatureScheme::Ed25519 => {
                let bytes: [u8; 32] = self.public_key.as_slice().try_into().map_err(|_| {
                    IdentityError::InvalidPublicKey(format!(
                        "ed25519 key must be 32 bytes, got {}",
                        self.public_key.len()
                    ))
                })?;
                let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                    .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
                Ok(Box::new(Ed25519Verifier(key)))
            }
            SignatureScheme::Secp256k1 => {
                let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&self.public_key)
                    .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
                Ok(Box::new(Secp256k1Verifier(key)))
            }
        }
    }
}

/// Factory for [`IdentityKind::Certificate`].
pub fn verifier(raw: &[u8], _: &Resolver<'_>) -> Result<Box<dyn Verifier>, IdentityError> {
    let cert: Certificate =
        wire::decode(raw).map_err(|e| IdentityError::Malformed(e.to_string()))?;
    cert.verifier()
}

struct Ed25519Verifier(ed25519_dalek::VerifyingKey);

impl Verifier for Ed25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
        let sig = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|e| IdentityError::InvalidSignature(e.to_string()))?;
        self.0
            .verify(message, &sig)
            .map_err(|_| IdentityError::VerificationFailed)
    }
}

struct Secp256k1Verifier(k256::ecdsa::VerifyingKey);

impl Verifier for Secp256k1Verifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
        let sig = k256::ecdsa::Signature::from_der(signature)
            .map_err(|e| IdentityError::InvalidSignature(e.to_string()))?;
        self.0
            .verify(message, &sig)
            .map_err(|_| IdentityError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519() {
        use ed25519_dalek::{Signer, SigningKey};
        use rand::rngs::OsRng;

        let sk = SigningKey::generate(&mut OsRng);
        let cert = Certificate::ed25519(&sk.verifying_key());
        let verifier = cert.verifier().unwrap();

        let signature = sk.sign(b"zkat").to_bytes().to_vec();
        assert!(verifier.verify(b"zkat", &signature).is_ok());

        // tampered sig
        let mut tampered = signature.clone();
        tampered[0] ^= 0xFF;
        assert!(verifier.verify(b"zkat", &tampered).is_err());

        assert!(matches!(
            verifier.verify(b"zkat", &signature[..10]),
            Err(IdentityError::InvalidSignature(_))
        ));
    }

    #[test]
    fn secp256k1() {
        use k256::ecdsa::signature::Signer;
        use k256::ecdsa::{Signature, SigningKey};
        use k256::elliptic_curve::rand_core::OsRng;

        let sk = SigningKey::random(&mut OsRng);
        let cert = Certificate::secp256k1(sk.verifying_key());
        let verifier = cert.verifier().unwrap();

        let signature: Signature = sk.sign(b"zkat");
        let der = signature.to_der().as_bytes().to_vec();
        assert!(verifier.verify(b"zkat", &der).is_ok());

        // tampered message
        assert_eq!(
            verifier.verify(b"tampered", &der),
            Err(IdentityError::VerificationFailed)
        );
    }

    #[test]
    fn bad_keys() {
        let short = Certificate {
            scheme: SignatureScheme::Ed25519,
            public_key: vec![1; 31],
        };
        assert!(matches!(short.verifier(), Err(IdentityError::InvalidPublicKey(_))));

        let garbage = Certificate {
            scheme: SignatureScheme::Secp256k1,
            public_key: vec![7; 33],
        };
        assert!(matches!(garbage.verifier(), Err(IdentityError::InvalidPublicKey(_))));
    }
}
