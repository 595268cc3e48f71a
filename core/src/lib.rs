/// Issue and transfer actions, and their decoding
pub mod action;
/// Time sources for script deadlines
pub mod clock;
/// Pedersen commitments to token type and value
pub mod commitment;
pub mod error;
/// secp256k1 points, scalars and hashing to the curve
pub mod group;
/// Hash-time-lock scripts
pub mod htlc;
/// Typed identities, verifiers and the identity deserializer
pub mod identity;
/// JSON (de)serialization of public parameters
#[cfg(feature = "json")]
pub mod interface;
/// Public parameters of a token system
pub mod params;
/// Zero-knowledge proofs over token commitments
pub mod proof;
/// Plaintext quantity parsing
pub mod quantity;
/// The token request envelope and signature correlation
pub mod request;
/// Tokens and upgrade witnesses
pub mod token;
/// Token request validation pipeline
pub mod validator;
mod wire;

pub use action::{ActionInput, ActionKind, IssueAction, TransferAction};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commitment::{Generators, TokenWitness};
pub use error::{HtlcError, IdentityError, ProofError, QuantityError, ScriptError, ValidationError};
pub use group::{Commitment, CompressedPoint};
pub use htlc::{ClaimSignature, HashEncoding, HashFunction, HashInfo, Script};
pub use identity::{Deserializer, IdentityDeserializer, IdentityKind, Role, TypedIdentity, Verifier};
pub use params::PublicParams;
pub use proof::{IssueProof, TransferProof};
pub use request::{SignatureBackend, SignatureProvider, TokenRequest};
pub use token::{Token, UpgradeWitness};
pub use validator::{ValidatedRequest, Validator, ValidatorBuilder};
pub use wire::MAX_WIRE_SIZE;

pub type Result<T> = std::result::Result<T, ValidationError>;
