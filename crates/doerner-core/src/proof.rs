//! Schnorr proof of knowledge of a discrete logarithm
//!
//! Proves knowledge of `x` such that `X = x * G`, made non-interactive with
//! Fiat-Shamir over a caller-supplied [`Transcript`]. The transcript carries
//! the session binding; the proof only appends its own statement and
//! commitment before drawing the challenge.

use crate::{curve::COMPRESSED_POINT_BYTES, scalar::SCALAR_BYTES, Error, Point, Result, Scalar};
use merlin::Transcript;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

/// Encoded length of a [`SchnorrProof`]
pub const SCHNORR_PROOF_BYTES: usize = COMPRESSED_POINT_BYTES + SCALAR_BYTES;

/// Proof of knowledge of the discrete log of a public point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrProof {
    /// Commitment to the mask (`A = a * G`)
    commitment: Point,
    /// Response `z = e * x + a`
    response: Scalar,
}

impl SchnorrProof {
    /// Prove knowledge of `secret` with `public = secret * G`
    pub fn prove<R: CryptoRngCore + ?Sized>(
        rng: &mut R,
        transcript: &Transcript,
        public: &Point,
        secret: &Scalar,
    ) -> Self {
        let mask = Scalar::random(rng);
        let commitment = Point::act_on_base(&mask);
        let challenge = Self::challenge(transcript, public, &commitment);
        let response = Scalar::multiply_add(&challenge, secret, &mask);

        Self {
            commitment,
            response,
        }
    }

    /// Check the proof against `public` under the same transcript state
    pub fn verify(&self, transcript: &Transcript, public: &Point) -> bool {
        if public.is_identity() || self.commitment.is_identity() {
            return false;
        }
        let challenge = Self::challenge(transcript, public, &self.commitment);
        let lhs = Point::act_on_base(&self.response);
        let rhs = self.commitment.add(&public.scale(&challenge));
        lhs == rhs
    }

    /// Fixed-width encoding: compressed commitment followed by the response
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SCHNORR_PROOF_BYTES);
        out.extend_from_slice(&self.commitment.to_bytes());
        out.extend_from_slice(&self.response.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCHNORR_PROOF_BYTES {
            return Err(Error::Deserialization(format!(
                "schnorr proof must be {} bytes, got {}",
                SCHNORR_PROOF_BYTES,
                bytes.len()
            )));
        }
        let (commitment, response) = bytes.split_at(COMPRESSED_POINT_BYTES);
        Ok(Self {
            commitment: Point::from_bytes(commitment)?,
            response: Scalar::from_bytes(response)?,
        })
    }

    fn challenge(transcript: &Transcript, public: &Point, commitment: &Point) -> Scalar {
        let mut transcript = transcript.clone();
        transcript.append_message(b"schnorr public", &public.to_bytes());
        transcript.append_message(b"schnorr commitment", &commitment.to_bytes());
        let mut wide = [0u8; 64];
        transcript.challenge_bytes(b"schnorr challenge", &mut wide);
        Scalar::from_wide_bytes(&wide)
    }
}
