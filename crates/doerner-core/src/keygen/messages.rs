//! Keygen message types
//!
//! Messages are named after the round that consumes them.

use super::commitment::KeygenCommit;
use crate::{proof::SchnorrProof, Point};
use serde::{Deserialize, Serialize};

/// Emitted by round 1: first setup message and key commitment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeygenRound2Message {
    /// Opaque correlated OT setup data
    pub setup: Vec<u8>,
    /// Commitment to the sender's public key contribution
    pub commitment: KeygenCommit,
}

/// Emitted by round 2: second setup message and the commitment opening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeygenRound3Message {
    /// Opaque correlated OT setup data
    pub setup: Vec<u8>,
    /// Public key contribution `X_i = x_i * G`
    pub public_share: Point,
    /// Commitment randomness
    pub nonce: [u8; 32],
    /// Proof of knowledge of `x_i`
    pub proof: SchnorrProof,
}
