use bincode::{Decode, Encode};
use k256::{ProjectivePoint, Scalar};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use super::TranscriptProtocol;
use crate::error::ProofError;
use crate::group::{random_scalar, scalar_from_bytes, scalar_to_bytes, CompressedPoint, ScalarBytes};

/// Proof of knowledge of `x` such that `y = x·base`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DlogProof {
    pub commitment: CompressedPoint,
    pub response: ScalarBytes,
}

impl DlogProof {
    pub fn prove<R: RngCore + CryptoRng>(
        transcript: &mut Transcript,
        base: &ProjectivePoint,
        y: &ProjectivePoint,
        x: &Scalar,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        transcript.append_point(b"dlog.y", y);
        let k = random_scalar(rng);
        let commitment = CompressedPoint::from_point(&(base * &k))?;
        transcript.append_compressed(b"dlog.a", &commitment);
        let c = transcript.challenge_scalar(b"dlog.c");

        Ok(Self {
            commitment,
            response: scalar_to_bytes(&(k + c * x)),
        })
    }

    pub fn verify(
        &self,
        transcript: &mut Transcript,
        base: &ProjectivePoint,
        y: &ProjectivePoint,
    ) -> Result<(), ProofError> {
        transcript.append_point(b"dlog.y", y);
        transcript.append_compressed(b"dlog.a", &self.commitment);
        let c = transcript.challenge_scalar(b"dlog.c");

        let a = self.commitment.decompress()?;
        let z = scalar_from_bytes(&self.response)?;
        (base * &z == a + y * &c)
            .then_some(())
            .ok_or(ProofError::VerificationFailed("discrete log"))
    }
}

/// Proof of knowledge of `(x0, x1)` such that `y = x0·bases[0] + x1·bases[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RepresentationProof {
    pub commitment: CompressedPoint,
    pub responses: [ScalarBytes; 2],
}

impl RepresentationProof {
    pub fn prove<R: RngCore + CryptoRng>(
        transcript: &mut Transcript,
        bases: [&ProjectivePoint; 2],
        y: &ProjectivePoint,
        secrets: [&Scalar; 2],
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        transcript.append_point(b"rep.y", y);
        let k0 = random_scalar(rng);
        let k1 = random_scalar(rng);
        let commitment = CompressedPoint::from_point(&(bases[0] * &k0 + bases[1] * &k1))?;
        transcript.append_compressed(b"rep.a", &commitment);
        let c = transcript.challenge_scalar(b"rep.c");

        Ok(Self {
            commitment,
            responses: [
                scalar_to_bytes(&(k0 + c * secrets[0])),
                scalar_to_bytes(&(k1 + c * secrets[1])),
            ],
        })
    }

    pub fn verify(
        &self,
        transcript: &mut Transcript,
        bases: [&ProjectivePoint; 2],
        y: &ProjectivePoint,
    ) -> Result<(), ProofError> {
        transcript.append_point(b"rep.y", y);
        transcript.append_compressed(b"rep.a", &self.commitment);
        let c = transcript.challenge_scalar(b"rep.c");

        let a = self.commitment.decompress()?;
        let z0 = scalar_from_bytes(&self.responses[0])?;
        let z1 = scalar_from_bytes(&self.responses[1])?;
        (bases[0] * &z0 + bases[1] * &z1 == a + y * &c)
            .then_some(())
            .ok_or(ProofError::VerificationFailed("representation"))
    }
}

/// One-of-two proof that `b = ρ·h` or `b - g = ρ·h`, i.e. that `b`
/// commits to a bit under value base `g` and blinding base `h`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BitProof {
    pub commitments: [CompressedPoint; 2],
    /// Challenge share of the zero branch; the one branch gets the rest.
    pub challenge: ScalarBytes,
    pub responses: [ScalarBytes; 2],
}

impl BitProof {
    pub fn prove<R: RngCore + CryptoRng>(
        transcript: &mut Transcript,
        g: &ProjectivePoint,
        h: &ProjectivePoint,
        b: &ProjectivePoint,
        bit: bool,
        blinding: &Scalar,
        rng: &mut R,
    ) -> Result<Self, ProofError> {
        let statements = [*b, b - g];
        let (real, fake) = if bit { (1, 0) } else { (0, 1) };

        // simulate the branch we cannot prove
        let fake_c = random_scalar(rng);
        let fake_z = random_scalar(rng);
        let fake_a = h * &fake_z - statements[fake] * &fake_c;

        let k = random_scalar(rng);
        let real_a = h * &k;

        let mut a = [ProjectivePoint::IDENTITY; 2];
        a[real] = real_a;
        a[fake] = fake_a;
        let commitments = [
            CompressedPoint::from_point(&a[0])?,
            CompressedPoint::from_point(&a[1])?,
        ];
        transcript.append_compressed(b"bit.a0", &commitments[0]);
        transcript.append_compressed(b"bit.a1", &commitments[1]);
        let c = transcript.challenge_scalar(b"bit.c");

        let real_c = c - fake_c;
        let mut z = [Scalar::ZERO; 2];
        z[real] = k + real_c * blinding;
        z[fake] = fake_z;
        let zero_c = if bit { fake_c } else { real_c };

        Ok(Self {
            commitments,
            challenge: scalar_to_bytes(&zero_c),
            responses: [scalar_to_bytes(&z[0]), scalar_to_bytes(&z[1])],
        })
    }

    pub fn verify(
        &self,
        transcript: &mut Transcript,
        g: &ProjectivePoint,
        h: &ProjectivePoint,
        b: &ProjectivePoint,
    ) -> Result<(), ProofError> {
        transcript.append_compressed(b"bit.a0", &self.commitments[0]);
        transcript.append_compressed(b"bit.a1", &self.commitments[1]);
        let c = transcript.challenge_scalar(b"bit.c");

        let a0 = self.commitments[0].decompress()?;
        let a1 = self.commitments[1].decompress()?;
        let c0 = scalar_from_bytes(&self.challenge)?;
        let c1 = c - c0;
        let z0 = scalar_from_bytes(&self.responses[0])?;
        let z1 = scalar_from_bytes(&self.responses[1])?;

        let zero_branch = h * &z0 == a0 + b * &c0;
        let one_branch = h * &z1 == a1 + (b - g) * &c1;
        (zero_branch && one_branch)
            .then_some(())
            .ok_or(ProofError::VerificationFailed("bit"))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::params::PublicParams;

    fn bases() -> (ProjectivePoint, ProjectivePoint) {
        let gens = PublicParams::setup(8).unwrap().commitment_generators().unwrap();
        (gens.value_base, gens.blinding_base)
    }

    #[test]
    fn dlog() {
        let (_, h) = bases();
        let x = random_scalar(&mut OsRng);
        let y = h * &x;

        let proof =
            DlogProof::prove(&mut Transcript::new(b"test"), &h, &y, &x, &mut OsRng).unwrap();
        assert!(proof.verify(&mut Transcript::new(b"test"), &h, &y).is_ok());

        // different statement
        assert!(proof
            .verify(&mut Transcript::new(b"test"), &h, &(y + h))
            .is_err());
        // different transcript context
        assert!(proof.verify(&mut Transcript::new(b"other"), &h, &y).is_err());
    }

    #[test]
    fn dlog_with_wrong_witness_fails() {
        let (_, h) = bases();
        let x = random_scalar(&mut OsRng);
        let y = h * &x;
        let wrong = x + Scalar::ONE;

        let proof =
            DlogProof::prove(&mut Transcript::new(b"test"), &h, &y, &wrong, &mut OsRng).unwrap();
        assert_eq!(
            proof.verify(&mut Transcript::new(b"test"), &h, &y),
            Err(ProofError::VerificationFailed("discrete log"))
        );
    }

    #[test]
    fn representation() {
        let (g, h) = bases();
        let x0 = random_scalar(&mut OsRng);
        let x1 = random_scalar(&mut OsRng);
        let y = g * &x0 + h * &x1;

        let mut transcript = Transcript::new(b"test");
        let proof =
            RepresentationProof::prove(&mut transcript, [&g, &h], &y, [&x0, &x1], &mut OsRng)
                .unwrap();
        assert!(proof.verify(&mut Transcript::new(b"test"), [&g, &h], &y).is_ok());
        assert!(proof.verify(&mut Transcript::new(b"test"), [&h, &g], &y).is_err());
    }

    #[test]
    fn bits() {
        let (g, h) = bases();
        for bit in [false, true] {
            let rho = random_scalar(&mut OsRng);
            let b = if bit { g + h * &rho } else { h * &rho };
            let mut transcript = Transcript::new(b"test");
            let proof =
                BitProof::prove(&mut transcript, &g, &h, &b, bit, &rho, &mut OsRng).unwrap();
            assert!(proof.verify(&mut Transcript::new(b"test"), &g, &h, &b).is_ok());
        }
    }

    #[test]
    fn non_bit_is_rejected() {
        let (g, h) = bases();
        let rho = random_scalar(&mut OsRng);
        // commits to 2, claim either branch
        let b = g + g + h * &rho;
        for bit in [false, true] {
            let mut transcript = Transcript::new(b"test");
            let proof =
                BitProof::prove(&mut transcript, &g, &h, &b, bit, &rho, &mut OsRng).unwrap();
            assert!(proof.verify(&mut Transcript::new(b"test"), &g, &h, &b).is_err());
        }
    }
}
