use bincode::{Decode, Encode};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use super::range::RangeProof;
use super::sigma::RepresentationProof;
use super::{decompress_all, TranscriptProtocol};
use crate::commitment::{type_scalar, TokenWitness};
use crate::error::ProofError;
use crate::group::{random_scalar, Commitment, CompressedPoint};
use crate::params::PublicParams;
use crate::wire;

const ISSUE_LABEL: &[u8] = b"zkat.issue";

/// Proof that every issued output commits to the same token type and to a
/// value within the configured precision.
///
/// A type commitment `CT = t·G0 + s·G2` is opened by `type_proof`; each
/// output minus `CT` then carries a range proof over `G1`/`G2`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct IssueProof {
    pub type_commitment: CompressedPoint,
    pub type_proof: RepresentationProof,
    pub ranges: Vec<RangeProof>,
}

impl IssueProof {
    pub fn prove<R: RngCore + CryptoRng>(
        params: &PublicParams,
        outputs: &[TokenWitness],
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let first = outputs
            .first()
            .ok_or_else(|| ProofError::Malformed("issue has no outputs".into()))?;
        if outputs.iter().any(|w| w.token_type != first.token_type) {
            return Err(ProofError::Malformed(
                "issued outputs must share one token type".into(),
            ));
        }
        let gens = params.commitment_generators()?;
        let commitments = outputs
            .iter()
            .map(|w| w.commitment(&gens))
            .collect::<Result<Vec<_>, _>>()?;

        let mut transcript = statement(params, &commitments);
        let t = type_scalar(&first.token_type);
        let s = random_scalar(rng);
        let ct = gens.type_base * &t + gens.blinding_base * &s;
        let type_commitment = CompressedPoint::from_point(&ct)?;
        transcript.append_compressed(b"issue.ct", &type_commitment);
        let type_proof = RepresentationProof::prove(
            &mut transcript,
            [&gens.type_base, &gens.blinding_base],
            &ct,
            [&t, &s],
            rng,
        )?;

        let ranges = outputs
            .iter()
            .zip(&commitments)
            .map(|(w, c)| {
                let d = c.decompress()? - ct;
                RangeProof::prove(
                    &mut transcript,
                    &gens,
                    &d,
                    w.value,
                    &(w.blinding - s),
                    params.precision,
                    rng,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            type_commitment,
            type_proof,
            ranges,
        })
    }

    /// Verifies the proof against the output commitments of an issue action.
    pub fn verify(&self, params: &PublicParams, outputs: &[Commitment]) -> Result<(), ProofError> {
        if outputs.is_empty() {
            return Err(ProofError::Malformed("issue has no outputs".into()));
        }
        if self.ranges.len() != outputs.len() {
            return Err(ProofError::LengthMismatch {
                what: "range proofs",
                expected: outputs.len(),
                got: self.ranges.len(),
            });
        }
        let gens = params.commitment_generators()?;
        let points = decompress_all(outputs)?;

        let mut transcript = statement(params, outputs);
        transcript.append_compressed(b"issue.ct", &self.type_commitment);
        let ct = self.type_commitment.decompress()?;
        self.type_proof
            .verify(&mut transcript, [&gens.type_base, &gens.blinding_base], &ct)?;

        for (range, out) in self.ranges.iter().zip(points) {
            range.verify(&mut transcript, &gens, &(out - ct), params.precision)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        wire::encode(self).map_err(|e| ProofError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        wire::decode(bytes).map_err(|e| ProofError::Malformed(e.to_string()))
    }
}

fn statement(params: &PublicParams, outputs: &[Commitment]) -> Transcript {
    let mut transcript = Transcript::new(ISSUE_LABEL);
    transcript.append_message(b"params", params.label.as_bytes());
    for g in &params.generators {
        transcript.append_compressed(b"generator", g);
    }
    for out in outputs {
        transcript.append_compressed(b"issue.out", out);
    }
    transcript
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;

    fn outputs(params: &PublicParams, values: &[u64]) -> (Vec<TokenWitness>, Vec<Commitment>) {
        let gens = params.commitment_generators().unwrap();
        let witnesses: Vec<_> = values
            .iter()
            .map(|v| TokenWitness::new("USD", *v, &mut OsRng))
            .collect();
        let commitments = witnesses.iter().map(|w| w.commitment(&gens).unwrap()).collect();
        (witnesses, commitments)
    }

    #[test]
    fn honest_issue_verifies() {
        let params = PublicParams::setup(16).unwrap();
        let (witnesses, commitments) = outputs(&params, &[100, 0, 65535]);
        let proof = IssueProof::prove(&params, &witnesses, &mut OsRng).unwrap();

        let decoded = IssueProof::from_bytes(&proof.to_bytes().unwrap()).unwrap();
        assert!(decoded.verify(&params, &commitments).is_ok());
    }

    #[test]
    fn rejects_other_outputs() {
        let params = PublicParams::setup(16).unwrap();
        let (witnesses, commitments) = outputs(&params, &[10, 20]);
        let proof = IssueProof::prove(&params, &witnesses, &mut OsRng).unwrap();

        let (_, others) = outputs(&params, &[10, 20]);
        assert!(proof.verify(&params, &others).is_err());
        assert!(proof.verify(&params, &commitments[..1]).is_err());

        let mut reordered = commitments.clone();
        reordered.swap(0, 1);
        assert!(proof.verify(&params, &reordered).is_err());
    }

    #[test]
    fn prover_rejects_mixed_types_and_overflow() {
        let params = PublicParams::setup(8).unwrap();
        let mixed = vec![
            TokenWitness::new("USD", 1, &mut OsRng),
            TokenWitness::new("EUR", 1, &mut OsRng),
        ];
        assert!(matches!(
            IssueProof::prove(&params, &mixed, &mut OsRng),
            Err(ProofError::Malformed(_))
        ));

        let big = vec![TokenWitness::new("USD", 256, &mut OsRng)];
        assert_eq!(
            IssueProof::prove(&params, &big, &mut OsRng),
            Err(ProofError::ValueOutOfRange { value: 256, bits: 8 })
        );
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        assert!(matches!(
            IssueProof::from_bytes(&[1, 2, 3]),
            Err(ProofError::Malformed(_))
        ));
    }
}
