//! Token request validation.
//!
//! A [`Validator`] decodes a request, checks the auditor signature when
//! auditing is enabled, then runs every issue and transfer action through
//! its pipeline of [`Step`]s. The first failing step aborts the whole
//! request; nothing is written anywhere.

use std::sync::Arc;

use tracing::{debug, debug_span, info, info_span, Span};

use crate::action::{deserialize_actions, ActionKind, IssueAction, TransferAction};
use crate::clock::{Clock, SystemClock};
use crate::commitment::Generators;
use crate::error::ValidationError;
use crate::identity::{Deserializer, IdentityDeserializer};
use crate::params::PublicParams;
use crate::request::{SignatureBackend, SignatureProvider, TokenRequest};
use crate::token::Token;
use crate::Result;

mod context;
mod htlc;
mod issue;
mod transfer;
mod upgrade;

use context::Outcome;
pub use context::{Context, MetadataCounter};
pub use htlc::TransferHtlcValidate;
pub use issue::{
    IssueActionValidate, IssueSignatureValidate, IssueZkProofValidate, IssuerAuthorizationValidate,
};
pub use transfer::{TransferActionValidate, TransferSignatureValidate, TransferZkProofValidate};
pub use upgrade::TransferUpgradeWitnessValidate;

/// One check in an action pipeline.
pub trait Step<A>: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, ctx: &mut Context<'_, A>) -> Result<()>;
}

/// Data derived while validating an issue action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueInfo {
    pub signatures: Vec<Vec<u8>>,
}

/// Data derived while validating a transfer action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInfo {
    /// Spent tokens, in input order.
    pub inputs: Vec<Token>,
    pub signatures: Vec<Vec<u8>>,
}

/// A request that passed validation, with everything the ledger needs to
/// commit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub issues: Vec<IssueAction>,
    pub transfers: Vec<TransferAction>,
    pub issue_info: Vec<IssueInfo>,
    pub transfer_info: Vec<TransferInfo>,
    /// Metadata keys consumed across the whole request, each exactly once.
    pub metadata: MetadataCounter,
}

/// Validates token requests against a fixed set of public parameters.
pub struct Validator {
    params: Arc<PublicParams>,
    generators: Generators,
    deserializer: Arc<dyn IdentityDeserializer>,
    clock: Arc<dyn Clock>,
    issue_steps: Vec<Box<dyn Step<IssueAction>>>,
    transfer_steps: Vec<Box<dyn Step<TransferAction>>>,
    span: Span,
}

impl Validator {
    pub fn builder(params: Arc<PublicParams>) -> ValidatorBuilder {
        ValidatorBuilder::new(params)
    }

    /// A validator with the built-in deserializer, the system clock and no
    /// extra steps.
    pub fn new(params: Arc<PublicParams>) -> Result<Self> {
        Self::builder(params).build()
    }

    pub fn params(&self) -> &PublicParams {
        &self.params
    }

    /// Decodes and validates a serialized [`TokenRequest`].
    pub fn verify_token_request_from_raw(
        &self,
        raw: &[u8],
        tx_id: &str,
    ) -> Result<ValidatedRequest> {
        let request = TokenRequest::from_bytes(raw)?;
        self.verify_token_request(&request, tx_id)
    }

    /// Validates `request`, taking signatures from the request itself over
    /// its signing payload for `tx_id`.
    pub fn verify_token_request(
        &self,
        request: &TokenRequest,
        tx_id: &str,
    ) -> Result<ValidatedRequest> {
        let span = debug_span!(parent: &self.span, "token_request", tx_id);
        let (issues, transfers) = deserialize_actions(request)?;

        let message = request.message_to_sign(tx_id)?;
        self.check_auditing(request, &message, &span)?;

        let backend = SignatureBackend::new(message, &request.signatures);
        let validated = self.run(&span, issues, transfers, &backend)?;
        if backend.remaining() > 0 {
            debug!(
                parent: &span,
                unused = backend.remaining(),
                "request carries unused signatures"
            );
        }
        Ok(validated)
    }

    /// Validates `request` with signatures correlated by `provider`.
    ///
    /// Auditing is left to the caller, who owns the signing payload.
    pub fn verify_with_provider(
        &self,
        request: &TokenRequest,
        provider: &dyn SignatureProvider,
    ) -> Result<ValidatedRequest> {
        let span = debug_span!(parent: &self.span, "token_request");
        let (issues, transfers) = deserialize_actions(request)?;
        self.run(&span, issues, transfers, provider)
    }

    fn check_auditing(&self, request: &TokenRequest, message: &[u8], span: &Span) -> Result<()> {
        let Some(auditor) = self.params.auditors.first() else {
            return Ok(());
        };
        let signature = request
            .auditor_signatures
            .first()
            .ok_or(ValidationError::MissingAuditorSignature)?;
        let verifier = self.deserializer.get_auditor_verifier(auditor)?;
        verifier.verify(message, signature).map_err(|e| {
            ValidationError::SignatureVerificationFailed(format!("auditor signature: {e}"))
        })?;
        debug!(parent: span, "auditor signature verified");
        Ok(())
    }

    fn run(
        &self,
        span: &Span,
        issues: Vec<IssueAction>,
        transfers: Vec<TransferAction>,
        provider: &dyn SignatureProvider,
    ) -> Result<ValidatedRequest> {
        let now = self.clock.now();
        let mut metadata = MetadataCounter::default();

        let mut issue_info = Vec::with_capacity(issues.len());
        for (index, action) in issues.iter().enumerate() {
            let outcome = self
                .run_steps(span, now, provider, ActionKind::Issue, index, action, &self.issue_steps)
                .map_err(|e| e.in_action(ActionKind::Issue, index))?;
            metadata.merge(&outcome.metadata);
            issue_info.push(IssueInfo {
                signatures: outcome.signatures,
            });
        }

        let mut transfer_info = Vec::with_capacity(transfers.len());
        for (index, action) in transfers.iter().enumerate() {
            let outcome = self
                .run_steps(
                    span,
                    now,
                    provider,
                    ActionKind::Transfer,
                    index,
                    action,
                    &self.transfer_steps,
                )
                .map_err(|e| e.in_action(ActionKind::Transfer, index))?;
            metadata.merge(&outcome.metadata);
            transfer_info.push(TransferInfo {
                inputs: outcome.input_tokens,
                signatures: outcome.signatures,
            });
        }

        if let Some((key, count)) = metadata.duplicates().next() {
            return Err(ValidationError::DuplicateMetadataKey {
                key: key.to_string(),
                count,
            });
        }

        info!(
            parent: span,
            issues = issues.len(),
            transfers = transfers.len(),
            "token request validated"
        );
        Ok(ValidatedRequest {
            issues,
            transfers,
            issue_info,
            transfer_info,
            metadata,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run_steps<A>(
        &self,
        span: &Span,
        now: u64,
        provider: &dyn SignatureProvider,
        kind: ActionKind,
        index: usize,
        action: &A,
        steps: &[Box<dyn Step<A>>],
    ) -> Result<Outcome> {
        let action_span = debug_span!(parent: span, "action", %kind, index);
        let mut ctx = Context::new(
            &self.params,
            &self.generators,
            self.deserializer.as_ref(),
            provider,
            &action_span,
            now,
            action,
        );
        for step in steps {
            debug!(parent: &action_span, step = step.name(), "running step");
            step.validate(&mut ctx)?;
        }
        Ok(ctx.finish())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let issue: Vec<_> = self.issue_steps.iter().map(|s| s.name()).collect();
        let transfer: Vec<_> = self.transfer_steps.iter().map(|s| s.name()).collect();
        f.debug_struct("Validator")
            .field("params", &self.params.label)
            .field("clock", &self.clock)
            .field("issue_steps", &issue)
            .field("transfer_steps", &transfer)
            .finish()
    }
}

/// Runtime options of a [`Validator`].
pub struct ValidatorBuilder {
    params: Arc<PublicParams>,
    deserializer: Option<Arc<dyn IdentityDeserializer>>,
    clock: Option<Arc<dyn Clock>>,
    span: Option<Span>,
    extra_issue_steps: Vec<Box<dyn Step<IssueAction>>>,
    extra_transfer_steps: Vec<Box<dyn Step<TransferAction>>>,
}

impl ValidatorBuilder {
    pub fn new(params: Arc<PublicParams>) -> Self {
        Self {
            params,
            deserializer: None,
            clock: None,
            span: None,
            extra_issue_steps: Vec::new(),
            extra_transfer_steps: Vec::new(),
        }
    }

    /// Replaces the built-in [`Deserializer`].
    pub fn deserializer(mut self, deserializer: Arc<dyn IdentityDeserializer>) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    /// Time source for script deadlines. Defaults to [`SystemClock`].
    ///
    /// The built-in deserializer shares this clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Parent span of every log emitted by the validator.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Appends a step run after the built-in issue steps.
    pub fn with_issue_step(mut self, step: impl Step<IssueAction> + 'static) -> Self {
        self.extra_issue_steps.push(Box::new(step));
        self
    }

    /// Appends a step run after the built-in transfer steps.
    pub fn with_transfer_step(mut self, step: impl Step<TransferAction> + 'static) -> Self {
        self.extra_transfer_steps.push(Box::new(step));
        self
    }

    pub fn build(self) -> Result<Validator> {
        self.params.validate()?;
        let generators = self.params.commitment_generators()?;
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let deserializer: Arc<dyn IdentityDeserializer> = self
            .deserializer
            .unwrap_or_else(|| Arc::new(Deserializer::new(self.params.clone(), clock.clone())));

        let mut issue_steps: Vec<Box<dyn Step<IssueAction>>> = vec![
            Box::new(IssueActionValidate),
            Box::new(IssueZkProofValidate),
            Box::new(IssuerAuthorizationValidate),
            Box::new(IssueSignatureValidate),
        ];
        issue_steps.extend(self.extra_issue_steps);

        let mut transfer_steps: Vec<Box<dyn Step<TransferAction>>> = vec![
            Box::new(TransferActionValidate),
            Box::new(TransferSignatureValidate),
            Box::new(TransferUpgradeWitnessValidate),
            Box::new(TransferZkProofValidate),
            Box::new(TransferHtlcValidate),
        ];
        transfer_steps.extend(self.extra_transfer_steps);

        Ok(Validator {
            params: self.params,
            generators,
            deserializer,
            clock,
            issue_steps,
            transfer_steps,
            span: self.span.unwrap_or_else(|| info_span!("validator")),
        })
    }
}
