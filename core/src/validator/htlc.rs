use tracing::debug;

use super::{Context, Step};
use crate::action::TransferAction;
use crate::error::{HtlcError, ValidationError};
use crate::htlc::{claim_key, lock_key, script_owner, ClaimSignature, Script};
use crate::Result;

/// Enforces the claim/reclaim rules on script-owned inputs and the lock
/// bookkeeping on script-owned outputs.
///
/// Must run after [`TransferSignatureValidate`](super::TransferSignatureValidate),
/// which collects the claim signatures.
pub struct TransferHtlcValidate;

impl Step<TransferAction> for TransferHtlcValidate {
    fn name(&self) -> &'static str {
        "TransferHtlcValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, TransferAction>) -> Result<()> {
        let action = ctx.action;
        for (index, input) in action.inputs.iter().enumerate() {
            let Some(script) = script_owner(&input.token.owner).map_err(HtlcError::from)? else {
                continue;
            };
            if action.inputs.len() != 1 || action.outputs.len() != 1 {
                return Err(HtlcError::InvalidShape {
                    inputs: action.inputs.len(),
                    outputs: action.outputs.len(),
                }
                .into());
            }
            let output_owner = &action.outputs[0].owner;

            if ctx.now < script.deadline {
                if output_owner != &script.recipient {
                    return Err(ValidationError::OwnersMismatch(
                        "claimed output must be owned by the script recipient".into(),
                    ));
                }
                let key = check_claim(ctx, index, &script)?;
                debug!(parent: ctx.span, index, key = %key, "script claimed");
                ctx.metadata.record(key);
            } else {
                if output_owner != &script.sender {
                    return Err(ValidationError::OwnersMismatch(
                        "reclaimed output must be owned by the script sender".into(),
                    ));
                }
                debug!(parent: ctx.span, index, "script reclaimed");
            }
        }

        for output in action.outputs.iter().filter(|o| !o.is_redeemed()) {
            let Some(script) = script_owner(&output.owner).map_err(HtlcError::from)? else {
                continue;
            };
            script.validate(ctx.now).map_err(HtlcError::from)?;

            let key = lock_key(&script.hash_info.hash);
            match action.metadata.get(&key) {
                None => return Err(HtlcError::MissingLockKey(key).into()),
                Some(value) if value != &script.hash_info.hash => {
                    return Err(HtlcError::LockValueMismatch(key).into())
                }
                Some(_) => {}
            }
            debug!(parent: ctx.span, key = %key, deadline = script.deadline, "script locked");
            ctx.metadata.record(key);
        }
        Ok(())
    }
}

/// Checks the claim signature collected for input `index` and the claim
/// metadata it must be paired with. Returns the claim key.
fn check_claim(ctx: &Context<'_, TransferAction>, index: usize, script: &Script) -> Result<String> {
    let signature = ctx.signatures.get(index).ok_or_else(|| {
        ValidationError::SignatureVerificationFailed(format!(
            "no signature collected for input {index}"
        ))
    })?;
    let claim = ClaimSignature::from_bytes(signature).map_err(|e| {
        ValidationError::SignatureVerificationFailed(format!("input {index} is not a claim: {e}"))
    })?;
    if !script.hash_info.verify_preimage(&claim.preimage) {
        return Err(ValidationError::SignatureVerificationFailed(
            "claim preimage does not match the locked hash".into(),
        ));
    }

    let key = claim_key(&script.hash_info.image(&claim.preimage));
    match ctx.action.metadata.get(&key) {
        None => Err(HtlcError::MissingClaimKey(key).into()),
        Some(value) if value != &claim.preimage => Err(HtlcError::ClaimValueMismatch(key).into()),
        Some(_) => Ok(key),
    }
}
