//! Correlated oblivious transfer setup
//!
//! Key generation drives the setup of a correlated OT (the base OTs that a
//! later OT extension is seeded from) alongside its own messages:
//! - [`base_ot`]: Chou–Orlandi base OT over the protocol curve
//! - [`correlated_setup`]: the two setup roles and their finalized outputs
//!
//! The setup objects are sealed: keygen only forwards opaque byte blobs between
//! its round boundaries and [`CorreOtSetup::advance`], then takes the result of
//! [`CorreOtSetup::finalize`].

mod base_ot;
pub mod correlated_setup;

pub use correlated_setup::{
    CorreOtReceiveSetup, CorreOtSendSetup, CorreOtSetupReceiver, CorreOtSetupSender,
};

use crate::PartyRole;
use merlin::Transcript;
use rand_core::CryptoRngCore;
use rayon::ThreadPool;
use std::sync::Arc;
use thiserror::Error;

/// Number of base OTs, i.e. the computational security parameter
pub const OT_PARAM: usize = 128;

/// Bytes needed to hold one choice bit per base OT
pub const OT_BYTES: usize = OT_PARAM / 8;

/// Key derived from a single base OT
pub type OtKey = [u8; 32];

/// Errors raised by the correlated OT setup
#[derive(Debug, Error)]
pub enum OtError {
    /// Steps must be run exactly once each, in order
    #[error("OT setup step {got} out of order, expected step {expected}")]
    OutOfOrder { expected: u8, got: u8 },

    /// Peer setup message has the wrong shape
    #[error("Malformed OT setup message: {0}")]
    Malformed(String),

    /// Peer's proof of knowledge for its base-OT key did not verify
    #[error("Invalid proof in OT setup message")]
    InvalidProof,

    /// Finalize was called before all steps ran
    #[error("OT setup is incomplete: {0} of 3 steps done")]
    Incomplete(u8),
}

/// Position in the setup sub-protocol
///
/// Step `N` is driven by keygen round `N`, and for `N > 1` only after the
/// peer's setup message from step `N - 1` is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetupStep {
    One,
    Two,
    Three,
}

impl SetupStep {
    pub fn number(&self) -> u8 {
        match self {
            SetupStep::One => 1,
            SetupStep::Two => 2,
            SetupStep::Three => 3,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// One role of the correlated OT setup
pub trait CorreOtSetup: sealed::Sealed + Send + Sized {
    /// Immutable setup handed to the signing phase
    type Output: Send;

    /// Keygen role that owns this side of the setup
    const ROLE: PartyRole;

    /// Create an empty setup bound to the session transcript
    fn new(pool: Arc<ThreadPool>, transcript: Transcript) -> Self;

    /// Consume the peer's message from the previous step and emit ours
    fn advance<R: CryptoRngCore + ?Sized>(
        &mut self,
        rng: &mut R,
        step: SetupStep,
        incoming: &[u8],
    ) -> Result<Vec<u8>, OtError>;

    /// Digest of every setup message absorbed so far
    fn transcript_digest(&self) -> [u8; 32];

    /// Seal the setup once all steps have run
    fn finalize(self) -> Result<Self::Output, OtError>;
}

fn digest_of(transcript: &Transcript) -> [u8; 32] {
    let mut transcript = transcript.clone();
    let mut digest = [0u8; 32];
    transcript.challenge_bytes(b"setup digest", &mut digest);
    digest
}

fn expect_empty(step: SetupStep, incoming: &[u8]) -> Result<(), OtError> {
    if incoming.is_empty() {
        Ok(())
    } else {
        Err(OtError::Malformed(format!(
            "expected no peer data at step {}, got {} bytes",
            step.number(),
            incoming.len()
        )))
    }
}
