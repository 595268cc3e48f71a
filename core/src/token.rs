//! Confidential tokens and the plaintext witnesses used to upgrade them.

use bincode::{Decode, Encode};

use crate::group::{Commitment, ScalarBytes};

/// A committed quantity of some token type, held by `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Token {
    /// Serialized typed owner identity. Empty for a redeemed token.
    pub owner: Vec<u8>,
    /// Pedersen commitment to the token type and quantity.
    pub data: Commitment,
}

impl Token {
    pub fn new(owner: Vec<u8>, data: Commitment) -> Self {
        Self { owner, data }
    }

    /// A token without an owner has been burned.
    pub fn is_redeemed(&self) -> bool {
        self.owner.is_empty()
    }
}

/// Plaintext opening of a token migrated from a non-confidential format.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct UpgradeWitness {
    pub token_type: String,
    /// Decimal or `0x`-prefixed hex quantity.
    pub quantity: String,
    pub owner: Vec<u8>,
    pub blinding_factor: ScalarBytes,
}

impl UpgradeWitness {
    pub fn new(
        token_type: impl Into<String>,
        quantity: u64,
        owner: Vec<u8>,
        blinding_factor: ScalarBytes,
    ) -> Self {
        Self {
            token_type: token_type.into(),
            quantity: format!("{quantity:#x}"),
            owner,
            blinding_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::CompressedPoint;

    #[test]
    fn redeemed_tokens() {
        let data = CompressedPoint([2; 33]);
        assert!(Token::new(vec![], data).is_redeemed());
        assert!(!Token::new(b"alice".to_vec(), data).is_redeemed());
    }

    #[test]
    fn witness_quantity_is_hex() {
        let w = UpgradeWitness::new("USD", 255, b"alice".to_vec(), [0; 32]);
        assert_eq!(w.quantity, "0xff");
        assert_eq!(crate::quantity::parse_quantity(&w.quantity, 8).unwrap(), 255);
    }
}
