//! The two roles of the correlated OT setup
//!
//! Roles are inverted with respect to the base OT: the correlated-OT
//! *receiver* acts as base-OT sender and ends up with both keys of every
//! instance, while the correlated-OT *sender* acts as base-OT receiver with a
//! secret choice string `Delta` and ends up with the keys `K_Delta`.
//!
//! | step | receiver emits        | sender emits   |
//! |------|-----------------------|----------------|
//! | 1    | `A`, proof of `a`     | nothing        |
//! | 2    | nothing               | `B_1..B_k`     |
//! | 3    | nothing               | nothing        |

use super::{
    base_ot::{receiver_choose, BaseOtSender},
    digest_of, expect_empty, sealed, CorreOtSetup, OtError, OtKey, SetupStep, OT_BYTES, OT_PARAM,
};
use crate::{
    curve::COMPRESSED_POINT_BYTES,
    proof::{SchnorrProof, SCHNORR_PROOF_BYTES},
    PartyRole, Point,
};
use merlin::Transcript;
use rand_core::CryptoRngCore;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{debug, error};
use zeroize::{Zeroize, ZeroizeOnDrop};

const RECEIVER_STEP_ONE_BYTES: usize = COMPRESSED_POINT_BYTES + SCHNORR_PROOF_BYTES;
const SENDER_STEP_TWO_BYTES: usize = OT_PARAM * COMPRESSED_POINT_BYTES;

fn setup_transcript(mut transcript: Transcript) -> Transcript {
    transcript.append_message(b"protocol", b"correlated ot setup");
    transcript
}

fn check_order(done: u8, step: SetupStep) -> Result<(), OtError> {
    if step.number() != done + 1 {
        return Err(OtError::OutOfOrder {
            expected: done + 1,
            got: step.number(),
        });
    }
    Ok(())
}

/// Finalized setup held by the correlated-OT sender
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CorreOtSendSetup {
    delta: [u8; OT_BYTES],
    k_delta: Vec<OtKey>,
    digest: [u8; 32],
}

impl CorreOtSendSetup {
    /// The secret correlation `Delta`
    pub fn delta(&self) -> &[u8; OT_BYTES] {
        &self.delta
    }

    /// Bit `i` of `Delta`
    pub fn delta_bit(&self, i: usize) -> bool {
        (self.delta[i / 8] >> (i % 8)) & 1 == 1
    }

    /// The base-OT keys selected by `Delta`
    pub fn k_delta(&self) -> &[OtKey] {
        &self.k_delta
    }

    /// Digest of the setup transcript
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

impl fmt::Debug for CorreOtSendSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorreOtSendSetup")
            .field("delta", &"[redacted]")
            .field("k_delta", &"[redacted]")
            .field("digest", &hex::encode(self.digest))
            .finish()
    }
}

/// Finalized setup held by the correlated-OT receiver
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CorreOtReceiveSetup {
    k0: Vec<OtKey>,
    k1: Vec<OtKey>,
    digest: [u8; 32],
}

impl CorreOtReceiveSetup {
    /// Keys for choice bit 0
    pub fn k0(&self) -> &[OtKey] {
        &self.k0
    }

    /// Keys for choice bit 1
    pub fn k1(&self) -> &[OtKey] {
        &self.k1
    }

    /// Digest of the setup transcript
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

impl fmt::Debug for CorreOtReceiveSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorreOtReceiveSetup")
            .field("k0", &"[redacted]")
            .field("k1", &"[redacted]")
            .field("digest", &hex::encode(self.digest))
            .finish()
    }
}

/// In-progress setup for the correlated-OT sender (base-OT receiver)
pub struct CorreOtSetupSender {
    pool: Arc<ThreadPool>,
    transcript: Transcript,
    done: u8,
    delta: [u8; OT_BYTES],
    k_delta: Vec<OtKey>,
}

impl sealed::Sealed for CorreOtSetupSender {}

impl CorreOtSetupSender {
    fn choices(&self) -> Vec<bool> {
        (0..OT_PARAM)
            .map(|i| (self.delta[i / 8] >> (i % 8)) & 1 == 1)
            .collect()
    }

    fn choose<R: CryptoRngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        incoming: &[u8],
    ) -> Result<Vec<u8>, OtError> {
        if incoming.len() != RECEIVER_STEP_ONE_BYTES {
            return Err(OtError::Malformed(format!(
                "base-OT key message must be {} bytes, got {}",
                RECEIVER_STEP_ONE_BYTES,
                incoming.len()
            )));
        }
        let (public, proof) = incoming.split_at(COMPRESSED_POINT_BYTES);
        let public =
            Point::from_bytes(public).map_err(|e| OtError::Malformed(e.to_string()))?;
        let proof =
            SchnorrProof::from_bytes(proof).map_err(|e| OtError::Malformed(e.to_string()))?;
        if !proof.verify(&self.transcript, &public) {
            error!("base-OT key proof failed to verify");
            return Err(OtError::InvalidProof);
        }
        self.transcript.append_message(b"receiver step 1", incoming);

        let choices = self.choices();
        let (messages, keys) = receiver_choose(&self.pool, rng, &public, &choices);
        self.k_delta = keys;

        let mut out = Vec::with_capacity(SENDER_STEP_TWO_BYTES);
        for message in &messages {
            out.extend_from_slice(&message.to_bytes());
        }
        self.transcript.append_message(b"sender step 2", &out);
        Ok(out)
    }
}

impl CorreOtSetup for CorreOtSetupSender {
    type Output = CorreOtSendSetup;

    const ROLE: PartyRole = PartyRole::Sender;

    fn new(pool: Arc<ThreadPool>, transcript: Transcript) -> Self {
        Self {
            pool,
            transcript: setup_transcript(transcript),
            done: 0,
            delta: [0u8; OT_BYTES],
            k_delta: Vec::new(),
        }
    }

    fn advance<R: CryptoRngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        step: SetupStep,
        incoming: &[u8],
    ) -> Result<Vec<u8>, OtError> {
        check_order(self.done, step)?;
        debug!(step = step.number(), "advancing correlated OT sender setup");

        let out = match step {
            SetupStep::One => {
                expect_empty(step, incoming)?;
                rng.fill_bytes(&mut self.delta);
                Vec::new()
            }
            SetupStep::Two => self.choose(rng, incoming)?,
            SetupStep::Three => {
                expect_empty(step, incoming)?;
                Vec::new()
            }
        };

        self.done = step.number();
        Ok(out)
    }

    fn transcript_digest(&self) -> [u8; 32] {
        digest_of(&self.transcript)
    }

    fn finalize(mut self) -> Result<CorreOtSendSetup, OtError> {
        if self.done != SetupStep::Three.number() {
            return Err(OtError::Incomplete(self.done));
        }
        Ok(CorreOtSendSetup {
            delta: self.delta,
            k_delta: std::mem::take(&mut self.k_delta),
            digest: digest_of(&self.transcript),
        })
    }
}

impl Drop for CorreOtSetupSender {
    fn drop(&mut self) {
        self.delta.zeroize();
        self.k_delta.zeroize();
    }
}

/// In-progress setup for the correlated-OT receiver (base-OT sender)
pub struct CorreOtSetupReceiver {
    pool: Arc<ThreadPool>,
    transcript: Transcript,
    done: u8,
    base: Option<BaseOtSender>,
    keys: Vec<(OtKey, OtKey)>,
}

impl sealed::Sealed for CorreOtSetupReceiver {}

impl CorreOtSetupReceiver {
    fn publish<R: CryptoRngCore + ?Sized>(&mut self, rng: &mut R) -> Vec<u8> {
        let base = BaseOtSender::new(&mut *rng);
        let proof = SchnorrProof::prove(rng, &self.transcript, base.public(), base.secret());

        let mut out = Vec::with_capacity(RECEIVER_STEP_ONE_BYTES);
        out.extend_from_slice(&base.public().to_bytes());
        out.extend_from_slice(&proof.to_bytes());
        self.transcript.append_message(b"receiver step 1", &out);

        self.base = Some(base);
        out
    }

    fn derive(&mut self, incoming: &[u8]) -> Result<(), OtError> {
        if incoming.len() != SENDER_STEP_TWO_BYTES {
            return Err(OtError::Malformed(format!(
                "base-OT choice message must be {} bytes, got {}",
                SENDER_STEP_TWO_BYTES,
                incoming.len()
            )));
        }
        let messages = incoming
            .chunks_exact(COMPRESSED_POINT_BYTES)
            .map(Point::from_bytes)
            .collect::<crate::Result<Vec<_>>>()
            .map_err(|e| OtError::Malformed(e.to_string()))?;
        self.transcript.append_message(b"sender step 2", incoming);

        let base = self
            .base
            .as_ref()
            .ok_or(OtError::Incomplete(self.done))?;
        self.keys = base.derive_keys(&self.pool, &messages);
        Ok(())
    }
}

impl CorreOtSetup for CorreOtSetupReceiver {
    type Output = CorreOtReceiveSetup;

    const ROLE: PartyRole = PartyRole::Receiver;

    fn new(pool: Arc<ThreadPool>, transcript: Transcript) -> Self {
        Self {
            pool,
            transcript: setup_transcript(transcript),
            done: 0,
            base: None,
            keys: Vec::new(),
        }
    }

    fn advance<R: CryptoRngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        step: SetupStep,
        incoming: &[u8],
    ) -> Result<Vec<u8>, OtError> {
        check_order(self.done, step)?;
        debug!(step = step.number(), "advancing correlated OT receiver setup");

        let out = match step {
            SetupStep::One => {
                expect_empty(step, incoming)?;
                self.publish(rng)
            }
            SetupStep::Two => {
                expect_empty(step, incoming)?;
                Vec::new()
            }
            SetupStep::Three => {
                self.derive(incoming)?;
                Vec::new()
            }
        };

        self.done = step.number();
        Ok(out)
    }

    fn transcript_digest(&self) -> [u8; 32] {
        digest_of(&self.transcript)
    }

    fn finalize(mut self) -> Result<CorreOtReceiveSetup, OtError> {
        if self.done != SetupStep::Three.number() {
            return Err(OtError::Incomplete(self.done));
        }
        let (k0, k1) = std::mem::take(&mut self.keys).into_iter().unzip();
        Ok(CorreOtReceiveSetup {
            k0,
            k1,
            digest: digest_of(&self.transcript),
        })
    }
}

impl Drop for CorreOtSetupReceiver {
    fn drop(&mut self) {
        self.keys.zeroize();
    }
}
