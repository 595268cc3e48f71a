//! secp256k1 point and scalar helpers shared by commitments, proofs and identities.

use bincode::{Decode, Encode};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::{Field, PrimeField};
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256};
use rand::{CryptoRng, RngCore};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "json")]
use serde_with::hex::Hex;
use sha2::{Digest, Sha256};

use crate::error::ProofError;

/// Size of a SEC1-compressed secp256k1 point.
pub const POINT_SIZE: usize = 33;

/// Size of a canonical scalar encoding.
pub const SCALAR_SIZE: usize = 32;

/// Canonical big-endian scalar encoding.
pub type ScalarBytes = [u8; SCALAR_SIZE];

/// A SEC1-compressed curve point as carried on the wire.
///
/// The identity point has no 33-byte compressed form, so it can never be
/// represented by this type.
#[cfg_attr(feature = "json", serde_with::serde_as)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct CompressedPoint(
    #[cfg_attr(feature = "json", serde(with = "serde_with::As::<Hex>"))] pub [u8; POINT_SIZE],
);

/// Pedersen commitments travel as compressed points.
pub type Commitment = CompressedPoint;

impl CompressedPoint {
    /// Compresses `point`, failing for the identity.
    pub fn from_point(point: &ProjectivePoint) -> Result<Self, ProofError> {
        let encoded = point.to_affine().to_encoded_point(true);
        let bytes: [u8; POINT_SIZE] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| ProofError::InvalidPoint)?;
        Ok(Self(bytes))
    }

    /// Decompresses into a curve point, rejecting off-curve encodings.
    pub fn decompress(&self) -> Result<ProjectivePoint, ProofError> {
        let encoded = EncodedPoint::from_bytes(self.0).map_err(|_| ProofError::InvalidPoint)?;
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .map(ProjectivePoint::from)
            .ok_or(ProofError::InvalidPoint)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for CompressedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompressedPoint({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for CompressedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// SEC1 bytes of any point, including the one-byte identity encoding.
pub(crate) fn point_bytes(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

pub(crate) fn scalar_to_bytes(scalar: &Scalar) -> ScalarBytes {
    scalar.to_bytes().into()
}

pub(crate) fn scalar_from_bytes(bytes: &ScalarBytes) -> Result<Scalar, ProofError> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*bytes)))
        .ok_or(ProofError::InvalidScalar)
}

pub(crate) fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    <Scalar as Field>::random(rng)
}

/// Reduces a 32-byte big-endian digest modulo the group order.
pub(crate) fn reduce_digest(digest: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce(U256::from_be_slice(digest))
}

/// Domain-separated SHA-256 hash of `message`, reduced to a scalar.
pub fn hash_to_scalar(domain: &[u8], message: &[u8]) -> Scalar {
    let digest: [u8; 32] = Sha256::new()
        .chain_update(domain)
        .chain_update(message)
        .finalize()
        .into();
    reduce_digest(&digest)
}

/// Maps `message` to a curve point with unknown discrete logarithm.
///
/// Try-and-increment: the first SHA-256 digest of
/// `domain || message || counter` that is a valid x-coordinate wins.
pub fn hash_to_point(domain: &[u8], message: &[u8]) -> ProjectivePoint {
    let mut counter: u32 = 0;
    loop {
        let digest = Sha256::new()
            .chain_update(domain)
            .chain_update(message)
            .chain_update(counter.to_be_bytes())
            .finalize();
        let mut candidate = [0u8; POINT_SIZE];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(&digest);
        if let Ok(point) = CompressedPoint(candidate).decompress() {
            return point;
        }
        counter = counter.wrapping_add(1);
    }
}
