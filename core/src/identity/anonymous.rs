//! Pseudonymous identities certified by an anonymous-credential issuer.
//!
//! A pseudonym is `nym = x·N + r·G`, where `N` is a base derived from the
//! credential issuer's public key and `G` the curve generator. The issuer
//! certifies a pseudonym with a Schnorr signature over it, so only
//! pseudonyms it has seen can own tokens. The holder signs by proving
//! knowledge of `(x, r)` in a transcript bound to the message; the issuer
//! never learns `x`, and pseudonyms derived for the same holder cannot be
//! linked by anyone else.

use bincode::{Decode, Encode};
use k256::{ProjectivePoint, Scalar};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use super::{IdentityKind, Resolver, TypedIdentity, Verifier};
use crate::error::IdentityError;
use crate::group::{hash_to_point, random_scalar, CompressedPoint};
use crate::proof::{DlogProof, RepresentationProof};
use crate::wire;

const NYM_BASE_DOMAIN: &[u8] = b"zkat.nym-base";
const NYM_CREDENTIAL_LABEL: &[u8] = b"zkat.nym-credential";
const NYM_SIGNATURE_LABEL: &[u8] = b"zkat.nym-signature";

/// Wire form of an anonymous-credential identity.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AnonymousCredential {
    pub issuer_key: CompressedPoint,
    pub nym: CompressedPoint,

    /// Issuer signature over `nym`, see [`CredentialIssuer::certify`].
    pub certificate: DlogProof,
}

impl AnonymousCredential {
    pub fn to_identity(&self) -> Result<Vec<u8>, IdentityError> {
        let raw = wire::encode(self).map_err(|e| IdentityError::Malformed(e.to_string()))?;
        TypedIdentity::new(IdentityKind::AnonymousCredential, raw).to_bytes()
    }

    /// Checks the issuer signature over the pseudonym.
    fn check_certificate(&self) -> Result<(), IdentityError> {
        let issuer = self
            .issuer_key
            .decompress()
            .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
        let mut transcript = credential_transcript(&self.issuer_key, &self.nym);
        self.certificate
            .verify(&mut transcript, &ProjectivePoint::GENERATOR, &issuer)
            .map_err(|_| IdentityError::UncertifiedCredential)
    }
}

/// Factory for [`IdentityKind::AnonymousCredential`].
///
/// The issuer key must be one of the credential issuer keys in the public
/// parameters, and must have certified the pseudonym.
pub fn verifier(raw: &[u8], resolver: &Resolver<'_>) -> Result<Box<dyn Verifier>, IdentityError> {
    let credential: AnonymousCredential =
        wire::decode(raw).map_err(|e| IdentityError::Malformed(e.to_string()))?;
    if !resolver
        .params()
        .credential_issuer_keys
        .contains(&credential.issuer_key)
    {
        return Err(IdentityError::UnknownIssuerKey);
    }
    credential.check_certificate()?;

    let base = nym_base(&credential.issuer_key);
    let nym = credential
        .nym
        .decompress()
        .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
    Ok(Box::new(NymVerifier {
        issuer_key: credential.issuer_key,
        base,
        nym,
    }))
}

fn nym_base(issuer_key: &CompressedPoint) -> ProjectivePoint {
    hash_to_point(NYM_BASE_DOMAIN, issuer_key.as_bytes())
}

fn credential_transcript(issuer_key: &CompressedPoint, nym: &CompressedPoint) -> Transcript {
    let mut transcript = Transcript::new(NYM_CREDENTIAL_LABEL);
    transcript.append_message(b"issuer", issuer_key.as_bytes());
    transcript.append_message(b"nym", nym.as_bytes());
    transcript
}

fn signing_transcript(issuer_key: &CompressedPoint, message: &[u8]) -> Transcript {
    let mut transcript = Transcript::new(NYM_SIGNATURE_LABEL);
    transcript.append_message(b"issuer", issuer_key.as_bytes());
    transcript.append_message(b"message", message);
    transcript
}

struct NymVerifier {
    issuer_key: CompressedPoint,
    base: ProjectivePoint,
    nym: ProjectivePoint,
}

impl Verifier for NymVerifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
        let proof: RepresentationProof =
            wire::decode(signature).map_err(|e| IdentityError::InvalidSignature(e.to_string()))?;
        let mut transcript = signing_transcript(&self.issuer_key, message);
        proof
            .verify(
                &mut transcript,
                [&self.base, &ProjectivePoint::GENERATOR],
                &self.nym,
            )
            .map_err(|_| IdentityError::VerificationFailed)
    }
}

/// Secret key of an anonymous-credential issuer.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    secret: Scalar,
}

impl CredentialIssuer {
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            secret: random_scalar(rng),
        }
    }

    /// The key to list in the public parameters.
    pub fn public_key(&self) -> Result<CompressedPoint, IdentityError> {
        CompressedPoint::from_point(&(ProjectivePoint::GENERATOR * &self.secret))
            .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))
    }

    /// Signs a holder's pseudonym.
    pub fn certify<R: RngCore + CryptoRng>(
        &self,
        nym: &CompressedPoint,
        rng: &mut R,
    ) -> Result<DlogProof, IdentityError> {
        let issuer_key = self.public_key()?;
        let public = ProjectivePoint::GENERATOR * &self.secret;
        let mut transcript = credential_transcript(&issuer_key, nym);
        DlogProof::prove(
            &mut transcript,
            &ProjectivePoint::GENERATOR,
            &public,
            &self.secret,
            rng,
        )
        .map_err(|e| IdentityError::InvalidSignature(e.to_string()))
    }
}

/// Holder-side secrets of a pseudonym.
#[derive(Debug, Clone)]
pub struct NymSigner {
    issuer_key: CompressedPoint,
    secret: Scalar,
    blinding: Scalar,
}

impl NymSigner {
    /// A fresh pseudonym under `issuer_key`.
    pub fn new<R: RngCore + CryptoRng>(issuer_key: CompressedPoint, rng: &mut R) -> Self {
        Self {
            issuer_key,
            secret: random_scalar(rng),
            blinding: random_scalar(rng),
        }
    }

    fn nym_point(&self) -> ProjectivePoint {
        nym_base(&self.issuer_key) * &self.secret + ProjectivePoint::GENERATOR * &self.blinding
    }

    /// The pseudonym to hand to the issuer for certification.
    pub fn nym(&self) -> Result<CompressedPoint, IdentityError> {
        CompressedPoint::from_point(&self.nym_point())
            .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))
    }

    /// The owner identity, once the issuer has certified [`Self::nym`].
    pub fn credential(&self, certificate: DlogProof) -> Result<AnonymousCredential, IdentityError> {
        Ok(AnonymousCredential {
            issuer_key: self.issuer_key,
            nym: self.nym()?,
            certificate,
        })
    }

    pub fn sign<R: RngCore + CryptoRng>(
        &self,
        message: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, IdentityError> {
        let base = nym_base(&self.issuer_key);
        let mut transcript = signing_transcript(&self.issuer_key, message);
        let proof = RepresentationProof::prove(
            &mut transcript,
            [&base, &ProjectivePoint::GENERATOR],
            &self.nym_point(),
            [&self.secret, &self.blinding],
            rng,
        )
        .map_err(|e| IdentityError::InvalidSignature(e.to_string()))?;
        wire::encode(&proof).map_err(|e| IdentityError::InvalidSignature(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::OsRng;

    use super::*;
    use crate::clock::FixedClock;
    use crate::identity::{Deserializer, IdentityDeserializer};
    use crate::params::PublicParams;

    fn deserializer(keys: Vec<CompressedPoint>) -> Deserializer {
        let params = PublicParams::setup(16).unwrap().with_credential_issuer_keys(keys);
        Deserializer::new(Arc::new(params), Arc::new(FixedClock(0)))
    }

    /// A holder certified by `issuer`.
    fn holder(issuer: &CredentialIssuer) -> (NymSigner, Vec<u8>) {
        let signer = NymSigner::new(issuer.public_key().unwrap(), &mut OsRng);
        let certificate = issuer.certify(&signer.nym().unwrap(), &mut OsRng).unwrap();
        let identity = signer.credential(certificate).unwrap().to_identity().unwrap();
        (signer, identity)
    }

    #[test]
    fn sign_and_verify() {
        let issuer = CredentialIssuer::new(&mut OsRng);
        let (signer, identity) = holder(&issuer);

        let verifier = deserializer(vec![issuer.public_key().unwrap()])
            .get_owner_verifier(&identity)
            .unwrap();
        let signature = signer.sign(b"request", &mut OsRng).unwrap();
        assert!(verifier.verify(b"request", &signature).is_ok());
        assert_eq!(
            verifier.verify(b"other request", &signature),
            Err(IdentityError::VerificationFailed)
        );

        // another holder under the same issuer cannot sign for this nym
        let (other, _) = holder(&issuer);
        let forged = other.sign(b"request", &mut OsRng).unwrap();
        assert!(verifier.verify(b"request", &forged).is_err());
    }

    #[test]
    fn unknown_issuer_key_is_rejected() {
        let (_, identity) = holder(&CredentialIssuer::new(&mut OsRng));
        let other = CredentialIssuer::new(&mut OsRng).public_key().unwrap();
        assert_eq!(
            deserializer(vec![other]).get_owner_verifier(&identity).err(),
            Some(IdentityError::UnknownIssuerKey)
        );
    }

    #[test]
    fn uncertified_nym_is_rejected() {
        let issuer = CredentialIssuer::new(&mut OsRng);
        let d = deserializer(vec![issuer.public_key().unwrap()]);

        // a certificate for another pseudonym does not carry over
        let signer = NymSigner::new(issuer.public_key().unwrap(), &mut OsRng);
        let other = NymSigner::new(issuer.public_key().unwrap(), &mut OsRng);
        let certificate = issuer.certify(&other.nym().unwrap(), &mut OsRng).unwrap();
        let identity = signer.credential(certificate).unwrap().to_identity().unwrap();
        assert_eq!(
            d.get_owner_verifier(&identity).err(),
            Some(IdentityError::UncertifiedCredential)
        );

        // nor can someone without the issuer secret certify
        let rogue = CredentialIssuer::new(&mut OsRng);
        let nym = signer.nym().unwrap();
        let mut transcript = credential_transcript(&issuer.public_key().unwrap(), &nym);
        let forged = DlogProof::prove(
            &mut transcript,
            &ProjectivePoint::GENERATOR,
            &(ProjectivePoint::GENERATOR * &rogue.secret),
            &rogue.secret,
            &mut OsRng,
        )
        .unwrap();
        let identity = signer.credential(forged).unwrap().to_identity().unwrap();
        assert_eq!(
            d.get_owner_verifier(&identity).err(),
            Some(IdentityError::UncertifiedCredential)
        );
    }
}
