//! bincode helpers for every wire type in the crate.

use bincode::config::{self, Config};
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};

/// Upper bound on a single decoded structure.
pub const MAX_WIRE_SIZE: usize = 16 * 1024 * 1024;

fn config() -> impl Config {
    config::standard().with_limit::<MAX_WIRE_SIZE>()
}

pub(crate) fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::encode_to_vec(value, config())
}

/// Decodes `bytes` as a `T`, rejecting trailing data.
pub(crate) fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T, DecodeError> {
    let (value, read) = bincode::decode_from_slice(bytes, config())?;
    if read != bytes.len() {
        return Err(DecodeError::OtherString(format!(
            "{} trailing bytes",
            bytes.len() - read
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode(&(7u32, String::from("zkat"))).unwrap();
        assert_eq!(
            decode::<(u32, String)>(&bytes).unwrap(),
            (7, "zkat".to_string())
        );

        bytes.push(0);
        assert!(decode::<(u32, String)>(&bytes).is_err());
    }
}
