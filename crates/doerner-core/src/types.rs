//! Core types shared by the protocol and its drivers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a session
pub type SessionId = [u8; 32];

/// Identifier of a party in a session
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(String);

impl PartyId {
    /// Create a new party identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Role a party plays in the correlated OT setup
///
/// The Sender plays "Alice" and the Receiver plays "Bob".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyRole {
    Sender,
    Receiver,
}

impl PartyRole {
    /// The role of the counterparty
    pub fn other(&self) -> Self {
        match self {
            PartyRole::Sender => PartyRole::Receiver,
            PartyRole::Receiver => PartyRole::Sender,
        }
    }

    pub(crate) fn label(&self) -> &'static [u8] {
        match self {
            PartyRole::Sender => b"sender",
            PartyRole::Receiver => b"receiver",
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartyRole::Sender => f.write_str("sender"),
            PartyRole::Receiver => f.write_str("receiver"),
        }
    }
}

/// Point-to-point message exchanged between the two parties
///
/// `round` is the number of the round that consumes the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender party ID
    pub from: PartyId,
    /// Receiver party ID
    pub to: PartyId,
    /// Round number
    pub round: u32,
    /// Encoded round payload
    pub data: Vec<u8>,
}

