//! Pedersen commitments to token type and value.
//!
//! A token commits to `t·G0 + v·G1 + r·G2` where `t` is the hashed token
//! type, `v` the quantity and `r` a blinding factor.

use k256::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};

use crate::error::ProofError;
use crate::group::{
    hash_to_scalar, random_scalar, scalar_to_bytes, Commitment, CompressedPoint, ScalarBytes,
};

const TOKEN_TYPE_DOMAIN: &[u8] = b"zkat.token-type";

/// Decoded Pedersen generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generators {
    pub type_base: ProjectivePoint,
    pub value_base: ProjectivePoint,
    pub blinding_base: ProjectivePoint,
}

impl Generators {
    pub fn commit(
        &self,
        type_scalar: &Scalar,
        value: &Scalar,
        blinding: &Scalar,
    ) -> ProjectivePoint {
        self.type_base * type_scalar + self.value_base * value + self.blinding_base * blinding
    }

    /// Commits to a token of `token_type` holding `value`.
    pub fn commit_token(
        &self,
        token_type: &str,
        value: u64,
        blinding: &Scalar,
    ) -> Result<Commitment, ProofError> {
        let point = self.commit(&type_scalar(token_type), &Scalar::from(value), blinding);
        CompressedPoint::from_point(&point)
    }
}

/// Maps a token type name to its commitment exponent.
pub fn type_scalar(token_type: &str) -> Scalar {
    hash_to_scalar(TOKEN_TYPE_DOMAIN, token_type.as_bytes())
}

/// Opening of a token commitment, known to the token holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWitness {
    pub token_type: String,
    pub value: u64,
    pub blinding: Scalar,
}

impl TokenWitness {
    /// A witness with a fresh random blinding factor.
    pub fn new<R: RngCore + CryptoRng>(
        token_type: impl Into<String>,
        value: u64,
        rng: &mut R,
    ) -> Self {
        Self {
            token_type: token_type.into(),
            value,
            blinding: random_scalar(rng),
        }
    }

    pub fn commitment(&self, generators: &Generators) -> Result<Commitment, ProofError> {
        generators.commit_token(&self.token_type, self.value, &self.blinding)
    }

    pub fn blinding_bytes(&self) -> ScalarBytes {
        scalar_to_bytes(&self.blinding)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::params::PublicParams;

    #[test]
    fn commitments_are_homomorphic() {
        let gens = PublicParams::setup(16).unwrap().commitment_generators().unwrap();
        let a = TokenWitness::new("USD", 30, &mut OsRng);
        let b = TokenWitness::new("USD", 12, &mut OsRng);

        let sum = a.commitment(&gens).unwrap().decompress().unwrap()
            + b.commitment(&gens).unwrap().decompress().unwrap();
        let expected = gens.commit(
            &(type_scalar("USD") + type_scalar("USD")),
            &Scalar::from(42u64),
            &(a.blinding + b.blinding),
        );
        assert_eq!(sum, expected);
    }

    #[test]
    fn commitment_binds_type_and_value() {
        let gens = PublicParams::setup(16).unwrap().commitment_generators().unwrap();
        let w = TokenWitness::new("USD", 30, &mut OsRng);
        let c = w.commitment(&gens).unwrap();

        let other_type = TokenWitness {
            token_type: "EUR".into(),
            ..w.clone()
        };
        let other_value = TokenWitness { value: 31, ..w.clone() };
        assert_ne!(other_type.commitment(&gens).unwrap(), c);
        assert_ne!(other_value.commitment(&gens).unwrap(), c);
        assert_eq!(w.commitment(&gens).unwrap(), c);
    }
}
