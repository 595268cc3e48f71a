//! Public parameters shared by every participant of a token system.

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "json")]
use serde_with::hex::Hex;

use crate::commitment::Generators;
use crate::error::ProofError;
use crate::group::{hash_to_point, CompressedPoint};
use crate::quantity::MAX_PRECISION;
use crate::wire;

/// Label of parameters produced by [`PublicParams::setup`].
pub const PARAMS_LABEL: &str = "zkat.secp256k1.v1";

/// Default quantity precision, in bits.
pub const DEFAULT_PRECISION: u8 = 64;

/// Number of Pedersen generators: type, value and blinding bases.
pub const GENERATOR_COUNT: usize = 3;

/// Supported elliptic curves.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Curve {
    Secp256k1,
}

/// Immutable system configuration.
///
/// Created once at setup and shared read-only by every validator.
#[cfg_attr(feature = "json", serde_with::serde_as)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct PublicParams {
    /// Free-form label identifying the parameter set.
    pub label: String,

    pub curve: Curve,

    /// Pedersen generators `[G0, G1, G2]` for type, value and blinding factor.
    pub generators: Vec<CompressedPoint>,

    /// Bit length of every committed quantity.
    pub precision: u8,

    /// Serialized identities allowed to issue. Empty means anyone may issue.
    #[cfg_attr(feature = "json", serde(with = "serde_with::As::<Vec<Hex>>"))]
    pub issuers: Vec<Vec<u8>>,

    /// Serialized auditor identities. Empty disables auditing.
    #[cfg_attr(feature = "json", serde(with = "serde_with::As::<Vec<Hex>>"))]
    pub auditors: Vec<Vec<u8>>,

    /// Public keys of anonymous-credential issuers.
    pub credential_issuer_keys: Vec<CompressedPoint>,
}

impl PublicParams {
    /// Derives fresh parameters with nothing-up-my-sleeve generators.
    pub fn setup(precision: u8) -> Result<Self, ProofError> {
        let generators = ["G0", "G1", "G2"]
            .iter()
            .map(|name| {
                CompressedPoint::from_point(&hash_to_point(
                    PARAMS_LABEL.as_bytes(),
                    name.as_bytes(),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let params = Self {
            label: PARAMS_LABEL.to_string(),
            curve: Curve::Secp256k1,
            generators,
            precision,
            issuers: Vec::new(),
            auditors: Vec::new(),
            credential_issuer_keys: Vec::new(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_issuers(mut self, issuers: Vec<Vec<u8>>) -> Self {
        self.issuers = issuers;
        self
    }

    pub fn with_auditors(mut self, auditors: Vec<Vec<u8>>) -> Self {
        self.auditors = auditors;
        self
    }

    pub fn with_credential_issuer_keys(mut self, keys: Vec<CompressedPoint>) -> Self {
        self.credential_issuer_keys = keys;
        self
    }

    /// Checks precision bounds and that every generator decodes.
    pub fn validate(&self) -> Result<(), ProofError> {
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(ProofError::InvalidParams(format!(
                "precision must be in 1..={MAX_PRECISION}, got {}",
                self.precision
            )));
        }
        self.commitment_generators().map(|_| ())
    }

    /// Decodes the Pedersen generators.
    pub fn commitment_generators(&self) -> Result<Generators, ProofError> {
        let [type_base, value_base, blinding_base]: [CompressedPoint; GENERATOR_COUNT] =
            self.generators
                .clone()
                .try_into()
                .map_err(|g: Vec<CompressedPoint>| ProofError::LengthMismatch {
                    what: "generators",
                    expected: GENERATOR_COUNT,
                    got: g.len(),
                })?;
        let generators = Generators {
            type_base: type_base.decompress()?,
            value_base: value_base.decompress()?,
            blinding_base: blinding_base.decompress()?,
        };
        if generators.type_base == generators.value_base
            || generators.type_base == generators.blinding_base
            || generators.value_base == generators.blinding_base
        {
            return Err(ProofError::InvalidParams("generators must be distinct".into()));
        }
        Ok(generators)
    }

    /// Whether `issuer` may issue tokens. An empty issuer set admits anyone.
    pub fn is_authorized_issuer(&self, issuer: &[u8]) -> bool {
        self.issuers.is_empty() || self.issuers.iter().any(|i| i.as_slice() == issuer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        wire::encode(self).map_err(|e| ProofError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        let params: Self =
            wire::decode(bytes).map_err(|e| ProofError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_deterministic() {
        let a = PublicParams::setup(32).unwrap();
        let b = PublicParams::setup(32).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.generators.len(), GENERATOR_COUNT);
        assert!(a.commitment_generators().is_ok());
    }

    #[test]
    fn rejects_bad_precision() {
        assert!(PublicParams::setup(0).is_err());
        assert!(PublicParams::setup(65).is_err());
        assert!(PublicParams::setup(64).is_ok());
    }

    #[test]
    fn rejects_bad_generators() {
        let mut params = PublicParams::setup(16).unwrap();
        params.generators.pop();
        assert_eq!(
            params.validate(),
            Err(ProofError::LengthMismatch {
                what: "generators",
                expected: 3,
                got: 2
            })
        );

        let mut params = PublicParams::setup(16).unwrap();
        params.generators[2] = params.generators[1];
        assert!(params.validate().is_err());
    }

    #[test]
    fn issuer_authorization() {
        let open = PublicParams::setup(16).unwrap();
        assert!(open.is_authorized_issuer(b"anyone"));

        let closed = open.with_issuers(vec![b"alice".to_vec()]);
        assert!(closed.is_authorized_issuer(b"alice"));
        assert!(!closed.is_authorized_issuer(b"bob"));
        assert!(!closed.is_authorized_issuer(b"alice2"));
    }

    #[test]
    fn bytes_roundtrip() {
        let params = PublicParams::setup(16)
            .unwrap()
            .with_issuers(vec![b"issuer".to_vec()])
            .with_auditors(vec![b"auditor".to_vec()]);
        let bytes = params.to_bytes().unwrap();
        assert_eq!(PublicParams::from_bytes(&bytes).unwrap(), params);
        assert!(PublicParams::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
