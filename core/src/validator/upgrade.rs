use tracing::debug;

use super::{Context, Step};
use crate::action::TransferAction;
use crate::error::ValidationError;
use crate::group::scalar_from_bytes;
use crate::quantity::parse_quantity;
use crate::Result;

/// Recomputes the commitment of every input carrying an upgrade witness.
///
/// The witness must open to exactly the input's commitment and name the
/// same owner.
pub struct TransferUpgradeWitnessValidate;

impl Step<TransferAction> for TransferUpgradeWitnessValidate {
    fn name(&self) -> &'static str {
        "TransferUpgradeWitnessValidate"
    }

    fn validate(&self, ctx: &mut Context<'_, TransferAction>) -> Result<()> {
        for (index, input) in ctx.action.inputs.iter().enumerate() {
            let Some(witness) = &input.upgrade_witness else {
                continue;
            };
            let value = parse_quantity(&witness.quantity, ctx.params.precision)?;
            // a non-canonical blinding factor cannot open any commitment
            let blinding = scalar_from_bytes(&witness.blinding_factor)
                .map_err(|_| ValidationError::CommitmentMismatch { index })?;
            let recomputed = ctx
                .generators
                .commit_token(&witness.token_type, value, &blinding)?;
            if recomputed != input.token.data {
                return Err(ValidationError::CommitmentMismatch { index });
            }
            if witness.owner != input.token.owner {
                return Err(ValidationError::OwnersMismatch(format!(
                    "upgrade witness owner differs from the owner of input {index}"
                )));
            }
            debug!(parent: ctx.span, index, "upgrade witness matches input");
        }
        Ok(())
    }
}
