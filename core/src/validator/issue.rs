use tracing::debug;

use super::{Context, Step};
use crate::action::IssueAction;
use crate::error::ValidationError;
use crate::proof::IssueProof;
use crate::Result;

/// Structural checks on the action.
pub struct IssueActionValidate;

impl Step<IssueAction> for IssueActionValidate {
    fn name(&self) -> &'static str {
        "IssueActionValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, IssueAction>) -> Result<()> {
        ctx.action.validate()
    }
}

/// Verifies the issue proof against the output commitments.
pub struct IssueZkProofValidate;

impl Step<IssueAction> for IssueZkProofValidate {
    fn name(&self) -> &'static str {
        "IssueZkProofValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, IssueAction>) -> Result<()> {
        let outputs = ctx.action.output_commitments();
        IssueProof::from_bytes(&ctx.action.proof)
            .and_then(|proof| proof.verify(ctx.params, &outputs))
            .map_err(ValidationError::IssueVerificationFailed)?;
        debug!(parent: ctx.span, outputs = outputs.len(), "issue proof verified");
        Ok(())
    }
}

/// Restricts issuance to the configured issuer set, if any.
pub struct IssuerAuthorizationValidate;

impl Step<IssueAction> for IssuerAuthorizationValidate {
    fn name(&self) -> &'static str {
        "IssuerAuthorizationValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, IssueAction>) -> Result<()> {
        if ctx.params.is_authorized_issuer(&ctx.action.issuer) {
            Ok(())
        } else {
            Err(ValidationError::IssuerNotAuthorized)
        }
    }
}

/// Requires the issuer's signature over the request.
pub struct IssueSignatureValidate;

impl Step<IssueAction> for IssueSignatureValidate {
    fn name(&self) -> &'static str {
        "IssueSignatureValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, IssueAction>) -> Result<()> {
        let issuer = &ctx.action.issuer;
        let verifier = ctx.deserializer.get_issuer_verifier(issuer)?;
        let signature = ctx
            .signature_provider
            .has_been_signed_by(issuer, verifier.as_ref())?;
        ctx.signatures.push(signature);
        Ok(())
    }
}
