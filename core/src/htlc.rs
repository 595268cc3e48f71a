//! Hash-time-lock scripts.
//!
//! A script-owned token can be claimed by the recipient before the
//! deadline by revealing a preimage of the locked hash, or reclaimed by
//! the sender once the deadline has passed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bincode::{Decode, Encode};
use sha2::{Digest, Sha256, Sha512};
use sha3::Sha3_256;
use subtle::ConstantTimeEq;

use crate::error::ScriptError;
use crate::identity::{IdentityKind, TypedIdentity};
use crate::wire;

/// Metadata key prefix recording a lock on a hash.
pub const LOCK_KEY_PREFIX: &str = "htlc.lock.";

/// Metadata key prefix recording a claim of a hash image.
pub const CLAIM_KEY_PREFIX: &str = "htlc.claim.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum HashFunction {
    #[default]
    Sha256,
    Sha512,
    Sha3_256,
}

impl HashFunction {
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
            Self::Sha3_256 => Sha3_256::digest(data).to_vec(),
        }
    }
}

/// How a digest is encoded before comparison with the locked hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum HashEncoding {
    #[default]
    None,
    Base64,
    Hex,
}

impl HashEncoding {
    pub fn encode(&self, digest: &[u8]) -> Vec<u8> {
        match self {
            Self::None => digest.to_vec(),
            Self::Base64 => BASE64.encode(digest).into_bytes(),
            Self::Hex => hex::encode(digest).into_bytes(),
        }
    }
}

/// The locked hash and how to recompute it from a preimage.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct HashInfo {
    pub hash: Vec<u8>,
    pub hash_func: HashFunction,
    pub encoding: HashEncoding,
}

impl HashInfo {
    /// Locks the image of `preimage` under `hash_func` and `encoding`.
    pub fn from_preimage(preimage: &[u8], hash_func: HashFunction, encoding: HashEncoding) -> Self {
        Self {
            hash: encoding.encode(&hash_func.digest(preimage)),
            hash_func,
            encoding,
        }
    }

    /// Encoded digest of `preimage`.
    pub fn image(&self, preimage: &[u8]) -> Vec<u8> {
        self.encoding.encode(&self.hash_func.digest(preimage))
    }

    /// Whether `preimage` opens the locked hash, compared in constant time.
    pub fn verify_preimage(&self, preimage: &[u8]) -> bool {
        self.image(preimage).as_slice().ct_eq(&self.hash).into()
    }
}

/// Hash-time-lock conditions attached to a token owner.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Script {
    pub sender: Vec<u8>,
    pub recipient: Vec<u8>,
    /// Unix seconds. Claims must happen strictly before it.
    pub deadline: u64,
    pub hash_info: HashInfo,
}

impl Script {
    /// Checks a script about to be locked at time `now`.
    pub fn validate(&self, now: u64) -> Result<(), ScriptError> {
        if self.sender.is_empty() {
            return Err(ScriptError::MissingSender);
        }
        if self.recipient.is_empty() {
            return Err(ScriptError::MissingRecipient);
        }
        if self.deadline <= now {
            return Err(ScriptError::Expired {
                deadline: self.deadline,
                now,
            });
        }
        if self.hash_info.hash.is_empty() {
            return Err(ScriptError::MissingHash);
        }
        Ok(())
    }

    /// Serializes as a typed script identity, usable as a token owner.
    pub fn to_identity(&self) -> Result<Vec<u8>, ScriptError> {
        let raw = wire::encode(self).map_err(|e| ScriptError::Encoding(e.to_string()))?;
        TypedIdentity::new(IdentityKind::Script, raw)
            .to_bytes()
            .map_err(|e| ScriptError::Encoding(e.to_string()))
    }

    pub fn from_raw(raw: &[u8]) -> Result<Self, ScriptError> {
        wire::decode(raw).map_err(|e| ScriptError::Malformed(e.to_string()))
    }
}

/// Unwraps `owner` into a script if it is a typed script identity.
///
/// Owners of any other kind, and bytes that are not a typed identity at
/// all, yield `None`. A script tag over undecodable bytes is an error.
pub fn script_owner(owner: &[u8]) -> Result<Option<Script>, ScriptError> {
    if owner.is_empty() {
        return Ok(None);
    }
    match TypedIdentity::from_bytes(owner) {
        Ok(typed) if typed.kind == IdentityKind::Script => Script::from_raw(&typed.raw).map(Some),
        _ => Ok(None),
    }
}

/// What a recipient presents to claim a script-owned token.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ClaimSignature {
    pub preimage: Vec<u8>,
    /// Recipient's signature over [`claim_message`].
    pub recipient_signature: Vec<u8>,
}

impl ClaimSignature {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ScriptError> {
        wire::encode(self).map_err(|e| ScriptError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        wire::decode(bytes).map_err(|e| ScriptError::Malformed(e.to_string()))
    }
}

/// The payload a recipient signs when claiming: `message ‖ preimage`.
pub fn claim_message(message: &[u8], preimage: &[u8]) -> Vec<u8> {
    [message, preimage].concat()
}

/// Metadata key under which a lock on `hash` is recorded.
pub fn lock_key(hash: &[u8]) -> String {
    format!("{LOCK_KEY_PREFIX}{}", hex::encode(hash))
}

/// Metadata key under which a claim of `image` is recorded.
pub fn claim_key(image: &[u8]) -> String {
    format!("{CLAIM_KEY_PREFIX}{}", hex::encode(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(deadline: u64) -> Script {
        Script {
            sender: b"sender".to_vec(),
            recipient: b"recipient".to_vec(),
            deadline,
            hash_info: HashInfo::from_preimage(b"secret", HashFunction::Sha256, HashEncoding::None),
        }
    }

    #[test]
    fn preimage() {
        for hash_func in [HashFunction::Sha256, HashFunction::Sha512, HashFunction::Sha3_256] {
            for encoding in [HashEncoding::None, HashEncoding::Base64, HashEncoding::Hex] {
                let info = HashInfo::from_preimage(b"secret", hash_func, encoding);
                assert!(info.verify_preimage(b"secret"));
                assert!(!info.verify_preimage(b"wrong-secret"));
                assert_eq!(info.image(b"secret"), info.hash);
            }
        }
    }

    #[test]
    fn encodings() {
        let digest = Sha256::digest(b"secret").to_vec();
        assert_eq!(HashEncoding::None.encode(&digest), digest);
        assert_eq!(HashEncoding::Hex.encode(&digest), hex::encode(&digest).into_bytes());
        assert_eq!(HashEncoding::Base64.encode(&digest).len(), 44);
    }

    #[test]
    fn validate() {
        assert!(script(100).validate(99).is_ok());
        assert_eq!(
            script(100).validate(100),
            Err(ScriptError::Expired {
                deadline: 100,
                now: 100
            })
        );

        let mut s = script(100);
        s.sender.clear();
        assert_eq!(s.validate(0), Err(ScriptError::MissingSender));

        let mut s = script(100);
        s.recipient.clear();
        assert_eq!(s.validate(0), Err(ScriptError::MissingRecipient));

        let mut s = script(100);
        s.hash_info.hash.clear();
        assert_eq!(s.validate(0), Err(ScriptError::MissingHash));
    }

    #[test]
    fn script_owner_unwrapping() {
        let s = script(100);
        assert_eq!(script_owner(&s.to_identity().unwrap()).unwrap(), Some(s));
        assert_eq!(script_owner(&[]).unwrap(), None);
        assert_eq!(script_owner(b"not a typed identity").unwrap(), None);

        let other = TypedIdentity::new(IdentityKind::Certificate, vec![1, 2, 3])
            .to_bytes()
            .unwrap();
        assert_eq!(script_owner(&other).unwrap(), None);

        let broken = TypedIdentity::new(IdentityKind::Script, vec![0xff])
            .to_bytes()
            .unwrap();
        assert!(matches!(script_owner(&broken), Err(ScriptError::Malformed(_))));
    }

    #[test]
    fn metadata_keys() {
        assert_eq!(lock_key(&[0xab, 0x01]), "htlc.lock.ab01");
        assert_eq!(claim_key(&[0xab, 0x01]), "htlc.claim.ab01");
        assert_eq!(claim_message(b"msg", b"pre"), b"msgpre".to_vec());
    }
}
