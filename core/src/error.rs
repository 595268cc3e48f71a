use thiserror::Error;

use crate::action::ActionKind;
use crate::identity::{IdentityKind, Role};

/// Token request validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The request envelope itself could not be decoded.
    #[error("malformed token request: {0}")]
    MalformedRequest(String),

    /// One of the serialized actions could not be decoded.
    #[error("malformed {kind} action at index {index}: {reason}")]
    MalformedAction {
        kind: ActionKind,
        index: usize,
        reason: String,
    },

    #[error("invalid issue action: {0}")]
    InvalidIssueAction(String),

    #[error("invalid transfer action: {0}")]
    InvalidTransferAction(String),

    #[error("invalid inputs: {0}")]
    InvalidInputs(String),

    #[error("invalid HTLC action: {0}")]
    InvalidHtlcAction(#[from] HtlcError),

    #[error("issuer is not authorized")]
    IssuerNotAuthorized,

    #[error("redeem requires an issuer")]
    MissingIssuer,

    #[error("auditor signature is missing")]
    MissingAuditorSignature,

    #[error("signature verification failed: {0}")]
    SignatureVerificationFailed(String),

    #[error("identity deserialization failed: {0}")]
    DeserializationFailed(#[from] IdentityError),

    #[error("issue proof verification failed: {0}")]
    IssueVerificationFailed(ProofError),

    #[error("commitment mismatch for input {index}")]
    CommitmentMismatch { index: usize },

    #[error("owners mismatch: {0}")]
    OwnersMismatch(String),

    #[error("quantity parse error: {0}")]
    QuantityParseError(#[from] QuantityError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("metadata key {key} recorded {count} times")]
    DuplicateMetadataKey { key: String, count: usize },

    /// Error raised while validating a specific action of a request.
    #[error("{kind} action {index}: {source}")]
    Action {
        kind: ActionKind,
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Wraps `self` with the position of the failing action.
    pub fn in_action(self, kind: ActionKind, index: usize) -> Self {
        Self::Action {
            kind,
            index,
            source: Box::new(self),
        }
    }

    /// Strips any action wrappers and returns the underlying error.
    pub fn root(&self) -> &ValidationError {
        match self {
            Self::Action { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors raised while resolving or using an identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("cannot deserialize identity from empty bytes")]
    EmptyIdentity,

    #[error("malformed identity: {0}")]
    Malformed(String),

    #[error("identity kind {kind} is not accepted for role {role}")]
    KindNotAllowed { kind: IdentityKind, role: Role },

    #[error("no verifier registered for identity kind {0}")]
    UnregisteredKind(IdentityKind),

    #[error("public key decoding error: {0}")]
    InvalidPublicKey(String),

    #[error("signature decoding error: {0}")]
    InvalidSignature(String),

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("credential issuer key is not part of the public parameters")]
    UnknownIssuerKey,

    #[error("pseudonym is not certified by its credential issuer")]
    UncertifiedCredential,

    #[error("needed at least {required} signatures, but only {satisfied} verified")]
    ThresholdNotMet { required: usize, satisfied: usize },

    #[error("invalid threshold {threshold} for {signers} signers")]
    InvalidThreshold { threshold: usize, signers: usize },

    #[error("claim preimage does not match the locked hash")]
    PreimageMismatch,

    #[error("identity nests more than {max} levels deep")]
    NestingTooDeep { max: usize },

    #[error("script error: {0}")]
    Script(#[from] ScriptError),
}

/// Errors from the proof system.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Malformed(String),

    #[error("invalid curve point encoding")]
    InvalidPoint,

    #[error("invalid scalar encoding")]
    InvalidScalar,

    #[error("expected {expected} {what}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid public parameters: {0}")]
    InvalidParams(String),

    #[error("{0} proof verification failed")]
    VerificationFailed(&'static str),

    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u64, bits: u8 },

    #[error("input and output values do not balance")]
    Unbalanced,

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Errors when parsing plaintext quantities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("cannot parse quantity from empty string")]
    Empty,

    #[error("invalid quantity {0:?}")]
    Invalid(String),

    #[error("quantity {quantity} exceeds {precision}-bit precision")]
    Overflow { quantity: String, precision: u8 },

    #[error("unsupported precision {0}")]
    InvalidPrecision(u8),
}

/// Errors from hash-time-lock script validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script sender is not set")]
    MissingSender,

    #[error("script recipient is not set")]
    MissingRecipient,

    #[error("script deadline {deadline} is not after {now}")]
    Expired { deadline: u64, now: u64 },

    #[error("script hash is not set")]
    MissingHash,

    #[error("malformed script: {0}")]
    Malformed(String),

    #[error("hash encoding error: {0}")]
    Encoding(String),
}

/// Violations of the conditional-transfer rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HtlcError {
    #[error("script input requires exactly one input and one output, got {inputs} and {outputs}")]
    InvalidShape { inputs: usize, outputs: usize },

    #[error("invalid script: {0}")]
    Script(#[from] ScriptError),

    #[error("lock metadata key {0} is missing")]
    MissingLockKey(String),

    #[error("lock metadata value for key {0} does not match the script hash")]
    LockValueMismatch(String),

    #[error("claim metadata key {0} is missing")]
    MissingClaimKey(String),

    #[error("claim metadata value for key {0} does not match the preimage")]
    ClaimValueMismatch(String),
}
