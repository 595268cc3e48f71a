//! Plaintext token quantities, as carried by upgrade witnesses.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::QuantityError;

/// Largest supported quantity precision, in bits.
pub const MAX_PRECISION: u8 = 64;

/// A non-negative quantity known to fit in a given precision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd)]
pub struct Quantity {
    value: BigUint,
    precision: u8,
}

impl Quantity {
    /// Parses a decimal or `0x`-prefixed hexadecimal quantity and checks it
    /// fits in `precision` bits.
    pub fn parse(s: &str, precision: u8) -> Result<Self, QuantityError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(QuantityError::InvalidPrecision(precision));
        }
        let s = s.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => (hex, 16),
            None => (s, 10),
        };
        // BigUint::parse_bytes tolerates '_' separators; quantities do not.
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(QuantityError::Invalid(s.to_string()));
        }
        let value = BigUint::parse_bytes(digits.as_bytes(), radix)
            .ok_or_else(|| QuantityError::Invalid(s.to_string()))?;

        if value.bits() > u64::from(precision) {
            return Err(QuantityError::Overflow {
                quantity: s.to_string(),
                precision,
            });
        }
        Ok(Self { value, precision })
    }

    /// Convert Self directly from an `u64`.
    pub fn from_u64(n: u64, precision: u8) -> Result<Self, QuantityError> {
        Self::parse(&n.to_string(), precision)
    }

    pub fn to_u64(&self) -> u64 {
        // parse() bounds the value by a precision of at most 64 bits
        self.value.to_u64().unwrap_or(u64::MAX)
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }
}

impl std::fmt::Display for Quantity {
    /// Print the quantity as a `0x`-prefixed hex string.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.value.to_str_radix(16))
    }
}

/// Parses `s` with [`Quantity::parse`] and returns it as a `u64`.
pub fn parse_quantity(s: &str, precision: u8) -> Result<u64, QuantityError> {
    Quantity::parse(s, precision).map(|q| q.to_u64())
}
