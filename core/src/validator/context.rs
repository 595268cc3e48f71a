use std::collections::BTreeMap;

use tracing::Span;

use crate::commitment::Generators;
use crate::identity::IdentityDeserializer;
use crate::params::PublicParams;
use crate::request::SignatureProvider;
use crate::token::Token;

/// Per-action scratch state shared by the steps of one pipeline run.
pub struct Context<'a, A> {
    pub params: &'a PublicParams,
    pub generators: &'a Generators,
    pub deserializer: &'a dyn IdentityDeserializer,
    pub signature_provider: &'a dyn SignatureProvider,
    pub span: &'a Span,
    /// Validation time, unix seconds.
    pub now: u64,
    pub action: &'a A,
    /// Spent tokens, in input order.
    pub input_tokens: Vec<Token>,
    /// Collected signatures: one per input in input order, then the
    /// issuer's when one was required.
    pub signatures: Vec<Vec<u8>>,
    pub metadata: MetadataCounter,
}

impl<'a, A> Context<'a, A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: &'a PublicParams,
        generators: &'a Generators,
        deserializer: &'a dyn IdentityDeserializer,
        signature_provider: &'a dyn SignatureProvider,
        span: &'a Span,
        now: u64,
        action: &'a A,
    ) -> Self {
        Self {
            params,
            generators,
            deserializer,
            signature_provider,
            span,
            now,
            action,
            input_tokens: Vec::new(),
            signatures: Vec::new(),
            metadata: MetadataCounter::default(),
        }
    }

    pub(crate) fn finish(self) -> Outcome {
        Outcome {
            input_tokens: self.input_tokens,
            signatures: self.signatures,
            metadata: self.metadata,
        }
    }
}

/// What a completed pipeline run leaves behind.
pub(crate) struct Outcome {
    pub input_tokens: Vec<Token>,
    pub signatures: Vec<Vec<u8>>,
    pub metadata: MetadataCounter,
}

/// How many times each metadata key was consumed.
///
/// A lock or claim key consumed twice within one request means the same
/// hash was locked or claimed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataCounter(BTreeMap<String, usize>);

impl MetadataCounter {
    pub fn record(&mut self, key: impl Into<String>) {
        *self.0.entry(key.into()).or_default() += 1;
    }

    pub fn count(&self, key: &str) -> usize {
        self.0.get(key).copied().unwrap_or_default()
    }

    pub fn merge(&mut self, other: &MetadataCounter) {
        for (key, count) in &other.0 {
            *self.0.entry(key.clone()).or_default() += count;
        }
    }

    /// Keys recorded more than once.
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, usize)> {
        self.iter().filter(|(_, count)| *count > 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
