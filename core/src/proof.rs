//! Non-interactive zero-knowledge proofs over Pedersen commitments.
//!
//! Every proof is a Fiat-Shamir sigma protocol driven by a `merlin`
//! transcript, so prover and verifier must append the same statement in
//! the same order.

use k256::{ProjectivePoint, Scalar};
use merlin::Transcript;

use crate::group::{point_bytes, reduce_digest, CompressedPoint};

/// Proof that all issued outputs share one type and lie in range.
pub mod issue;
/// Bit-decomposition range proofs.
pub mod range;
/// Schnorr, representation and one-of-two bit proofs.
pub mod sigma;
/// Balance proof for transfers.
pub mod transfer;

pub use issue::IssueProof;
pub use range::RangeProof;
pub use sigma::{BitProof, DlogProof, RepresentationProof};
pub use transfer::TransferProof;

/// Statement and challenge plumbing on top of [`Transcript`].
pub(crate) trait TranscriptProtocol {
    fn append_point(&mut self, label: &'static [u8], point: &ProjectivePoint);
    fn append_compressed(&mut self, label: &'static [u8], point: &CompressedPoint);
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn append_point(&mut self, label: &'static [u8], point: &ProjectivePoint) {
        self.append_message(label, &point_bytes(point));
    }

    fn append_compressed(&mut self, label: &'static [u8], point: &CompressedPoint) {
        self.append_message(label, point.as_bytes());
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 32];
        self.challenge_bytes(label, &mut buf);
        reduce_digest(&buf)
    }
}

/// Decompresses every commitment, failing on the first bad encoding.
pub(crate) fn decompress_all(
    points: &[CompressedPoint],
) -> Result<Vec<ProjectivePoint>, crate::error::ProofError> {
    points.iter().map(CompressedPoint::decompress).collect()
}
