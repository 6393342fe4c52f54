//! Schnorr proof of knowledge of a discrete logarithm
//!
//! Made non-interactive by deriving the challenge from a [`DomainHash`].

use super::{decode_point, encode_point, RandomOtError};
use crate::hash::DomainHash;
use k256::{
    elliptic_curve::{Field, PrimeField},
    ProjectivePoint, Scalar,
};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Proof that the prover knows `x` with `X = x * G`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DLogProof {
    /// Commitment `R = k * G` (compressed SEC1)
    pub(crate) commitment: Vec<u8>,
    /// Response `s = k + c * x`
    pub(crate) response: [u8; 32],
}

impl DLogProof {
    /// Prove knowledge of `secret` for `public = secret * G`
    pub fn prove<R: RngCore + CryptoRng>(
        hash: &DomainHash,
        secret: &Scalar,
        public: &ProjectivePoint,
        rng: &mut R,
    ) -> Self {
        let nonce = Scalar::random(&mut *rng);
        let commitment = ProjectivePoint::GENERATOR * nonce;
        let challenge = challenge(hash, public, &commitment);
        let response = nonce + challenge * secret;

        Self {
            commitment: encode_point(&commitment),
            response: response.to_bytes().into(),
        }
    }

    /// Verify the proof against `public`
    pub fn verify(&self, hash: &DomainHash, public: &ProjectivePoint) -> Result<(), RandomOtError> {
        let commitment = decode_point(&self.commitment)?;
        let response = Option::<Scalar>::from(Scalar::from_repr(self.response.into()))
            .ok_or(RandomOtError::InvalidProof)?;
        let challenge = challenge(hash, public, &commitment);

        if ProjectivePoint::GENERATOR * response != commitment + public * &challenge {
            return Err(RandomOtError::InvalidProof);
        }

        Ok(())
    }
}

fn challenge(hash: &DomainHash, public: &ProjectivePoint, commitment: &ProjectivePoint) -> Scalar {
    hash.challenge_scalar(
        b"dlog-proof",
        &[&encode_point(public), &encode_point(commitment)],
    )
}
