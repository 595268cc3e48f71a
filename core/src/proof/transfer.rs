use bincode::{Decode, Encode};
use k256::{ProjectivePoint, Scalar};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use super::range::RangeProof;
use super::sigma::{DlogProof, RepresentationProof};
use super::{decompress_all, TranscriptProtocol};
use crate::commitment::{type_scalar, TokenWitness};
use crate::error::ProofError;
use crate::group::{random_scalar, Commitment, CompressedPoint};
use crate::params::PublicParams;
use crate::wire;

const TRANSFER_LABEL: &[u8] = b"zkat.transfer";

/// Proof that a transfer preserves value and token type.
///
/// Against a type commitment `CT = t·G0 + s·G2`:
/// - every input minus `CT` is shown to have no `G0` component,
/// - every output minus `CT` carries a range proof,
/// - `Σ(in - CT) - Σ(out - CT)` is shown to be a multiple of `G2` alone,
///   which forces the committed values to balance.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferProof {
    pub type_commitment: CompressedPoint,
    pub type_proof: RepresentationProof,
    pub inputs: Vec<RepresentationProof>,
    pub ranges: Vec<RangeProof>,
    pub balance: DlogProof,
}

impl TransferProof {
    pub fn prove<R: RngCore + CryptoRng>(
        params: &PublicParams,
        inputs: &[TokenWitness],
        outputs: &[TokenWitness],
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let token_type = match (inputs.first(), outputs.is_empty()) {
            (Some(first), false) => &first.token_type,
            _ => {
                return Err(ProofError::Malformed(
                    "transfer needs at least one input and one output".into(),
                ))
            }
        };
        if inputs.iter().chain(outputs).any(|w| &w.token_type != token_type) {
            return Err(ProofError::Malformed(
                "inputs and outputs must share one token type".into(),
            ));
        }
        let total_in: u128 = inputs.iter().map(|w| u128::from(w.value)).sum();
        let total_out: u128 = outputs.iter().map(|w| u128::from(w.value)).sum();
        if total_in != total_out {
            return Err(ProofError::Unbalanced);
        }

        let gens = params.commitment_generators()?;
        let in_commitments = inputs
            .iter()
            .map(|w| w.commitment(&gens))
            .collect::<Result<Vec<_>, _>>()?;
        let out_commitments = outputs
            .iter()
            .map(|w| w.commitment(&gens))
            .collect::<Result<Vec<_>, _>>()?;

        let mut transcript = statement(params, &in_commitments, &out_commitments);
        let t = type_scalar(token_type);
        let s = random_scalar(rng);
        let ct = gens.type_base * &t + gens.blinding_base * &s;
        let type_commitment = CompressedPoint::from_point(&ct)?;
        transcript.append_compressed(b"transfer.ct", &type_commitment);
        let type_proof = RepresentationProof::prove(
            &mut transcript,
            [&gens.type_base, &gens.blinding_base],
            &ct,
            [&t, &s],
            rng,
        )?;

        let mut balance_point = ProjectivePoint::IDENTITY;
        let mut balance_blinding = Scalar::ZERO;

        let mut input_proofs = Vec::with_capacity(inputs.len());
        for (w, c) in inputs.iter().zip(&in_commitments) {
            let d = c.decompress()? - ct;
            let r = w.blinding - s;
            input_proofs.push(RepresentationProof::prove(
                &mut transcript,
                [&gens.value_base, &gens.blinding_base],
                &d,
                [&Scalar::from(w.value), &r],
                rng,
            )?);
            balance_point += d;
            balance_blinding += r;
        }

        let mut ranges = Vec::with_capacity(outputs.len());
        for (w, c) in outputs.iter().zip(&out_commitments) {
            let d = c.decompress()? - ct;
            let r = w.blinding - s;
            ranges.push(RangeProof::prove(
                &mut transcript,
                &gens,
                &d,
                w.value,
                &r,
                params.precision,
                rng,
            )?);
            balance_point -= d;
            balance_blinding -= r;
        }

        let balance = DlogProof::prove(
            &mut transcript,
            &gens.blinding_base,
            &balance_point,
            &balance_blinding,
            rng,
        )?;

        Ok(Self {
            type_commitment,
            type_proof,
            inputs: input_proofs,
            ranges,
            balance,
        })
    }

    /// Verifies the proof against the input and output commitments of a
    /// transfer action, in action order.
    pub fn verify(
        &self,
        params: &PublicParams,
        inputs: &[Commitment],
        outputs: &[Commitment],
    ) -> Result<(), ProofError> {
        if inputs.is_empty() || outputs.is_empty() {
            return Err(ProofError::Malformed(
                "transfer needs at least one input and one output".into(),
            ));
        }
        if self.inputs.len() != inputs.len() {
            return Err(ProofError::LengthMismatch {
                what: "input proofs",
                expected: inputs.len(),
                got: self.inputs.len(),
            });
        }
        if self.ranges.len() != outputs.len() {
            return Err(ProofError::LengthMismatch {
                what: "range proofs",
                expected: outputs.len(),
                got: self.ranges.len(),
            });
        }
        let gens = params.commitment_generators()?;
        let in_points = decompress_all(inputs)?;
        let out_points = decompress_all(outputs)?;

        let mut transcript = statement(params, inputs, outputs);
        transcript.append_compressed(b"transfer.ct", &self.type_commitment);
        let ct = self.type_commitment.decompress()?;
        self.type_proof
            .verify(&mut transcript, [&gens.type_base, &gens.blinding_base], &ct)?;

        let mut balance_point = ProjectivePoint::IDENTITY;
        for (proof, input) in self.inputs.iter().zip(in_points) {
            let d = input - ct;
            proof.verify(&mut transcript, [&gens.value_base, &gens.blinding_base], &d)?;
            balance_point += d;
        }
        for (range, output) in self.ranges.iter().zip(out_points) {
            let d = output - ct;
            range.verify(&mut transcript, &gens, &d, params.precision)?;
            balance_point -= d;
        }

        self.balance
            .verify(&mut transcript, &gens.blinding_base, &balance_point)
            .map_err(|_| ProofError::VerificationFailed("balance"))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        wire::encode(self).map_err(|e| ProofError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        wire::decode(bytes).map_err(|e| ProofError::Malformed(e.to_string()))
    }
}

fn statement(params: &PublicParams, inputs: &[Commitment], outputs: &[Commitment]) -> Transcript {
    let mut transcript = Transcript::new(TRANSFER_LABEL);
    transcript.append_message(b"params", params.label.as_bytes());
    for g in &params.generators {
        transcript.append_compressed(b"generator", g);
    }
    for input in inputs {
        transcript.append_compressed(b"transfer.in", input);
    }
    for output in outputs {
        transcript.append_compressed(b"transfer.out", output);
    }
    transcript
}
