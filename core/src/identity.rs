//! Typed identities and the signature verifiers they resolve to.
//!
//! Every identity travels as a [`TypedIdentity`]: a scheme tag plus the
//! scheme's own encoding. A [`Deserializer`] maps each tag to a factory
//! that turns the raw bytes into a [`Verifier`], and restricts which
//! schemes may act in which [`Role`].

use std::collections::BTreeMap;
use std::sync::Arc;

use bincode::{Decode, Encode};

use crate::clock::Clock;
use crate::error::IdentityError;
use crate::params::PublicParams;
use crate::wire;

/// Pseudonyms bound to an anonymous-credential issuer key.
pub mod anonymous;
/// Ed25519 and ECDSA public-key certificates.
pub mod certificate;
/// N-of-M escrow identities.
pub mod multisig;
/// Hash-time-lock script owners.
pub mod script;

/// Identity schemes understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum IdentityKind {
    AnonymousCredential,
    Certificate,
    Script,
    MultisigEscrow,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AnonymousCredential => "anonymous-credential",
            Self::Certificate => "certificate",
            Self::Script => "script",
            Self::MultisigEscrow => "multisig-escrow",
        };
        f.write_str(name)
    }
}

/// The capacity in which an identity signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Owner,
    Issuer,
    Auditor,
}

impl Role {
    /// Identity kinds accepted for this role.
    pub fn allowed_kinds(&self) -> &'static [IdentityKind] {
        match self {
            Self::Owner => &[
                IdentityKind::AnonymousCredential,
                IdentityKind::Certificate,
                IdentityKind::Script,
                IdentityKind::MultisigEscrow,
            ],
            Self::Issuer => &[IdentityKind::Certificate, IdentityKind::MultisigEscrow],
            Self::Auditor => &[IdentityKind::Certificate],
        }
    }

    pub fn allows(&self, kind: IdentityKind) -> bool {
        self.allowed_kinds().contains(&kind)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Owner => "owner",
            Self::Issuer => "issuer",
            Self::Auditor => "auditor",
        };
        f.write_str(name)
    }
}

/// Wire wrapper tagging raw identity bytes with their scheme.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TypedIdentity {
    pub kind: IdentityKind,
    pub raw: Vec<u8>,
}

impl TypedIdentity {
    pub fn new(kind: IdentityKind, raw: Vec<u8>) -> Self {
        Self { kind, raw }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, IdentityError> {
        wire::encode(self).map_err(|e| IdentityError::Malformed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        if bytes.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        wire::decode(bytes).map_err(|e| IdentityError::Malformed(e.to_string()))
    }
}

/// Checks signatures on behalf of a single identity.
pub trait Verifier: Send + Sync {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), IdentityError>;
}

/// Resolves serialized identities into verifiers, per role.
pub trait IdentityDeserializer: Send + Sync {
    fn get_owner_verifier(&self, identity: &[u8]) -> Result<Box<dyn Verifier>, IdentityError>;
    fn get_issuer_verifier(&self, identity: &[u8]) -> Result<Box<dyn Verifier>, IdentityError>;
    fn get_auditor_verifier(&self, identity: &[u8]) -> Result<Box<dyn Verifier>, IdentityError>;

    /// Resolves an owner as of `now`, for time-dependent schemes.
    fn get_owner_verifier_at(
        &self,
        identity: &[u8],
        now: u64,
    ) -> Result<Box<dyn Verifier>, IdentityError> {
        let _ = now;
        self.get_owner_verifier(identity)
    }
}

/// Maximum nesting of composite identities, the outermost one excluded.
pub const MAX_IDENTITY_DEPTH: usize = 8;

/// Builds a verifier from the raw bytes of one identity scheme.
pub type VerifierFactory =
    Box<dyn Fn(&[u8], &Resolver<'_>) -> Result<Box<dyn Verifier>, IdentityError> + Send + Sync>;

/// Registry-based [`IdentityDeserializer`].
///
/// The registry is fixed once built; factories receive a [`Resolver`] so
/// composite schemes can resolve their members.
pub struct Deserializer {
    params: Arc<PublicParams>,
    clock: Arc<dyn Clock>,
    factories: BTreeMap<IdentityKind, VerifierFactory>,
}

impl Deserializer {
    /// A deserializer with every built-in scheme registered.
    pub fn new(params: Arc<PublicParams>, clock: Arc<dyn Clock>) -> Self {
        Self::empty(params, clock)
            .with_factory(IdentityKind::AnonymousCredential, anonymous::verifier)
            .with_factory(IdentityKind::Certificate, certificate::verifier)
            .with_factory(IdentityKind::Script, script::verifier)
            .with_factory(IdentityKind::MultisigEscrow, multisig::verifier)
    }

    /// A deserializer with no scheme registered.
    pub fn empty(params: Arc<PublicParams>, clock: Arc<dyn Clock>) -> Self {
        Self {
            params,
            clock,
            factories: BTreeMap::new(),
        }
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn with_factory<F>(mut self, kind: IdentityKind, factory: F) -> Self
    where
        F: Fn(&[u8], &Resolver<'_>) -> Result<Box<dyn Verifier>, IdentityError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
        self
    }

    /// Resolves `identity` for `role` at the current clock reading.
    pub fn verifier(
        &self,
        identity: &[u8],
        role: Role,
    ) -> Result<Box<dyn Verifier>, IdentityError> {
        self.verifier_at(identity, role, self.clock.now())
    }

    /// Resolves `identity` for `role` as of `now`.
    pub fn verifier_at(
        &self,
        identity: &[u8],
        role: Role,
        now: u64,
    ) -> Result<Box<dyn Verifier>, IdentityError> {
        self.resolve(identity, role, now, 0)
    }

    fn resolve(
        &self,
        identity: &[u8],
        role: Role,
        now: u64,
        depth: usize,
    ) -> Result<Box<dyn Verifier>, IdentityError> {
        if depth > MAX_IDENTITY_DEPTH {
            return Err(IdentityError::NestingTooDeep {
                max: MAX_IDENTITY_DEPTH,
            });
        }
        let typed = TypedIdentity::from_bytes(identity)?;
        if !role.allows(typed.kind) {
            return Err(IdentityError::KindNotAllowed {
                kind: typed.kind,
                role,
            });
        }
        let factory = self
            .factories
            .get(&typed.kind)
            .ok_or(IdentityError::UnregisteredKind(typed.kind))?;
        factory(
            &typed.raw,
            &Resolver {
                deserializer: self,
                now,
                depth,
            },
        )
    }

    pub fn params(&self) -> &PublicParams {
        &self.params
    }
}

impl std::fmt::Debug for Deserializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deserializer")
            .field("params", &self.params.label)
            .field("clock", &self.clock)
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl IdentityDeserializer for Deserializer {
    fn get_owner_verifier(&self, identity: &[u8]) -> Result<Box<dyn Verifier>, IdentityError> {
        self.verifier(identity, Role::Owner)
    }

    fn get_issuer_verifier(&self, identity: &[u8]) -> Result<Box<dyn Verifier>, IdentityError> {
        self.verifier(identity, Role::Issuer)
    }

    fn get_auditor_verifier(&self, identity: &[u8]) -> Result<Box<dyn Verifier>, IdentityError> {
        self.verifier(identity, Role::Auditor)
    }

    fn get_owner_verifier_at(
        &self,
        identity: &[u8],
        now: u64,
    ) -> Result<Box<dyn Verifier>, IdentityError> {
        self.verifier_at(identity, Role::Owner, now)
    }
}

/// What a factory sees of the resolution in progress.
pub struct Resolver<'a> {
    deserializer: &'a Deserializer,
    now: u64,
    depth: usize,
}

impl Resolver<'_> {
    pub fn params(&self) -> &PublicParams {
        self.deserializer.params()
    }

    /// The instant the outermost identity is resolved at, unix seconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Resolves a member of the identity being built, one level deeper.
    pub fn member(&self, identity: &[u8], role: Role) -> Result<Box<dyn Verifier>, IdentityError> {
        self.deserializer.resolve(identity, role, self.now, self.depth + 1)
    }
}
