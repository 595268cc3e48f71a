use tracing::debug;

use super::{Context, Step};
use crate::action::TransferAction;
use crate::error::ValidationError;
use crate::proof::TransferProof;
use crate::Result;

/// Structural checks on the action.
pub struct TransferActionValidate;

impl Step<TransferAction> for TransferActionValidate {
    fn name(&self) -> &'static str {
        "TransferActionValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, TransferAction>) -> Result<()> {
        ctx.action.validate()
    }
}

/// Requires every input owner, and the issuer of a redeem, to have signed.
///
/// Fills the context with the spent tokens and their signatures.
pub struct TransferSignatureValidate;

impl Step<TransferAction> for TransferSignatureValidate {
    fn name(&self) -> &'static str {
        "TransferSignatureValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, TransferAction>) -> Result<()> {
        let action = ctx.action;
        if action.inputs.is_empty() {
            return Err(ValidationError::InvalidInputs("transfer has no inputs".into()));
        }

        for input in &action.inputs {
            let owner = &input.token.owner;
            let verifier = ctx.deserializer.get_owner_verifier_at(owner, ctx.now)?;
            let signature = ctx
                .signature_provider
                .has_been_signed_by(owner, verifier.as_ref())?;
            ctx.input_tokens.push(input.token.clone());
            ctx.signatures.push(signature);
        }

        if action.is_redeem() {
            let issuer = action.issuer.as_ref().ok_or(ValidationError::MissingIssuer)?;
            let verifier = ctx.deserializer.get_issuer_verifier(issuer)?;
            let signature = ctx
                .signature_provider
                .has_been_signed_by(issuer, verifier.as_ref())?;
            ctx.signatures.push(signature);
            debug!(parent: ctx.span, "redeem co-signed by issuer");
        }
        Ok(())
    }
}

/// Verifies the balance proof over input and output commitments.
pub struct TransferZkProofValidate;

impl Step<TransferAction> for TransferZkProofValidate {
    fn name(&self) -> &'static str {
        "TransferZkProofValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, TransferAction>) -> Result<()> {
        let inputs = ctx.action.input_commitments();
        let outputs = ctx.action.output_commitments();
        TransferProof::from_bytes(&ctx.action.proof)?.verify(ctx.params, &inputs, &outputs)?;
        debug!(
            parent: ctx.span,
            inputs = inputs.len(),
            outputs = outputs.len(),
            "transfer proof verified"
        );
        Ok(())
    }
}
