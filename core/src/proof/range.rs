use bincode::{Decode, Encode};
use k256::{ProjectivePoint, Scalar};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use super::sigma::{BitProof, DlogProof};
use super::{decompress_all, TranscriptProtocol};
use crate::commitment::Generators;
use crate::error::ProofError;
use crate::group::{random_scalar, CompressedPoint};

/// Proof that `d = v·G1 + δ·G2` with `0 <= v < 2^bits`.
///
/// `v` is split into bit commitments `B_i = b_i·G1 + ρ_i·G2`, each with a
/// [`BitProof`], and a [`DlogProof`] shows `d - Σ 2^i·B_i` lies on `G2`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RangeProof {
    pub bits: Vec<CompressedPoint>,
    pub bit_proofs: Vec<BitProof>,
    pub equality: DlogProof,
}

impl RangeProof {
    pub fn prove<R: RngCore + CryptoRng>(
        transcript: &mut Transcript,
        generators: &Generators,
        d: &ProjectivePoint,
        value: u64,
        blinding: &Scalar,
        bits: u8,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        if bits < 64 && value >> bits != 0 {
            return Err(ProofError::ValueOutOfRange { value, bits });
        }
        let g = &generators.value_base;
        let h = &generators.blinding_base;

        transcript.append_message(b"range.bits", &[bits]);
        transcript.append_point(b"range.d", d);

        let mut commitments = Vec::with_capacity(bits.into());
        let mut openings = Vec::with_capacity(bits.into());
        let mut weighted = Scalar::ZERO;
        for i in 0..bits {
            let bit = (value >> i) & 1 == 1;
            let rho = random_scalar(rng);
            let b = if bit { *g + h * &rho } else { h * &rho };
            let compressed = CompressedPoint::from_point(&b)?;
            transcript.append_compressed(b"range.b", &compressed);
            weighted += rho * power_of_two(i);
            commitments.push(compressed);
            openings.push((b, bit, rho));
        }

        let bit_proofs = openings
            .iter()
            .map(|(b, bit, rho)| BitProof::prove(transcript, g, h, b, *bit, rho, rng))
            .collect::<Result<Vec<_>, _>>()?;

        let residue = d - &weighted_sum(&openings.iter().map(|(b, _, _)| *b).collect::<Vec<_>>());
        let equality = DlogProof::prove(transcript, h, &residue, &(blinding - &weighted), rng)?;

        Ok(Self {
            bits: commitments,
            bit_proofs,
            equality,
        })
    }

    pub fn verify(
        &self,
        transcript: &mut Transcript,
        generators: &Generators,
        d: &ProjectivePoint,
        bits: u8,
    ) -> Result<(), ProofError> {
        let expected = usize::from(bits);
        if self.bits.len() != expected {
            return Err(ProofError::LengthMismatch {
                what: "bit commitments",
                expected,
                got: self.bits.len(),
            });
        }
        if self.bit_proofs.len() != expected {
            return Err(ProofError::LengthMismatch {
                what: "bit proofs",
                expected,
                got: self.bit_proofs.len(),
            });
        }
        let g = &generators.value_base;
        let h = &generators.blinding_base;

        transcript.append_message(b"range.bits", &[bits]);
        transcript.append_point(b"range.d", d);
        for b in &self.bits {
            transcript.append_compressed(b"range.b", b);
        }

        let points = decompress_all(&self.bits)?;
        for (proof, b) in self.bit_proofs.iter().zip(&points) {
            proof.verify(transcript, g, h, b)?;
        }

        let residue = d - &weighted_sum(&points);
        self.equality.verify(transcript, h, &residue)
    }
}

fn power_of_two(i: u8) -> Scalar {
    Scalar::from(1u64 << i)
}

/// `Σ 2^i·points[i]`
fn weighted_sum(points: &[ProjectivePoint]) -> ProjectivePoint {
    points
        .iter()
        .zip(0u8..)
        .fold(ProjectivePoint::IDENTITY, |acc, (p, i)| acc + p * &power_of_two(i))
}
