//! Session metadata, transcript binding and message envelopes
//!
//! A [`Session`] fixes everything both parties must agree on before the first
//! round: protocol id, round count, participants, threshold, group and the
//! caller-supplied session id. All of it is absorbed into a transcript so every
//! hash, commitment and proof produced later is bound to this session.

use crate::{Error, Group, Message, PartyId, Result, SessionId};
use merlin::Transcript;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use tracing::error;

/// Length of the session id accepted by [`Session::new`]
pub const SESSION_ID_LEN: usize = 32;

/// Static per-protocol metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Protocol identifier, e.g. `"doerner/keygen"`
    pub protocol_id: &'static str,
    /// Number of the terminal round
    pub final_round: u32,
    /// This party's ID
    pub self_id: PartyId,
    /// Participants, in the order `{self, other}`
    pub party_ids: [PartyId; 2],
    /// Threshold (number of parties minus one able to reconstruct)
    pub threshold: usize,
    /// Group the protocol runs over
    pub group: Group,
}

/// A running session: metadata plus the session-bound transcript
#[derive(Clone)]
pub struct Session {
    info: SessionInfo,
    session_id: SessionId,
    transcript: Transcript,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("info", &self.info)
            .field("session_id", &hex::encode(self.session_id))
            .finish()
    }
}

impl Session {
    /// Validate the metadata and bind it to `session_id`
    pub fn new(info: SessionInfo, session_id: &[u8]) -> Result<Self> {
        let session_id: SessionId = session_id.try_into().map_err(|_| {
            Error::Setup(format!(
                "session id must be {} bytes, got {}",
                SESSION_ID_LEN,
                session_id.len()
            ))
        })?;

        let [first, second] = &info.party_ids;
        if first.as_str().is_empty() || second.as_str().is_empty() {
            return Err(Error::Setup("party ids must not be empty".into()));
        }
        if first == second {
            return Err(Error::Setup(format!("duplicate party id {}", first)));
        }
        if info.self_id != *first {
            return Err(Error::Setup("self id must come first in party ids".into()));
        }
        if info.threshold + 1 != info.party_ids.len() {
            return Err(Error::Setup(format!(
                "threshold {} is invalid for {} parties",
                info.threshold,
                info.party_ids.len()
            )));
        }
        if info.final_round < 1 {
            return Err(Error::Setup("final round must be at least 1".into()));
        }

        let mut transcript = Transcript::new(info.protocol_id.as_bytes());
        transcript.append_u64(b"final round", u64::from(info.final_round));
        transcript.append_u64(b"threshold", info.threshold as u64);
        transcript.append_message(b"group", info.group.name().as_bytes());

        // Both parties list themselves first, so absorb in a canonical order
        let mut sorted: Vec<&PartyId> = info.party_ids.iter().collect();
        sorted.sort();
        for id in sorted {
            transcript.append_message(b"party id", id.as_bytes());
        }
        transcript.append_message(b"session id", &session_id);

        Ok(Self {
            info,
            session_id,
            transcript,
        })
    }

    /// Session metadata
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn self_id(&self) -> &PartyId {
        &self.info.self_id
    }

    pub fn other_id(&self) -> &PartyId {
        &self.info.party_ids[1]
    }

    pub fn group(&self) -> Group {
        self.info.group
    }

    /// A fresh copy of the session transcript
    pub fn hash(&self) -> Transcript {
        self.transcript.clone()
    }

    /// The session transcript with `id` absorbed, for per-party domain separation
    pub fn hash_for_id(&self, id: &PartyId) -> Transcript {
        let mut transcript = self.hash();
        transcript.append_message(b"party", id.as_bytes());
        transcript
    }

    /// Encode `content` as the message consumed by `round` at the peer
    pub fn message<T: Serialize>(&self, round: u32, content: &T) -> Result<Message> {
        Ok(Message {
            from: self.self_id().clone(),
            to: self.other_id().clone(),
            round,
            data: serde_json::to_vec(content)?,
        })
    }

    /// Check the envelope of the peer's message for `round` and decode it
    pub fn receive<T: DeserializeOwned>(
        &self,
        round: u32,
        incoming: Option<&Message>,
    ) -> Result<T> {
        let message = incoming.ok_or_else(|| {
            error!(round, "missing peer message");
            Error::Protocol(format!("missing message for round {}", round))
        })?;

        if message.round != round {
            error!(expected = round, got = message.round, "out-of-order message");
            return Err(Error::Protocol(format!(
                "expected message for round {}, got round {}",
                round, message.round
            )));
        }
        if message.from != *self.other_id() || message.to != *self.self_id() {
            error!(from = %message.from, to = %message.to, "message not addressed from peer to us");
            return Err(Error::Protocol(format!(
                "unexpected message from {} to {}",
                message.from, message.to
            )));
        }

        serde_json::from_slice(&message.data).map_err(|e| {
            error!(round, "malformed peer message");
            Error::Protocol(format!("malformed round {} message: {}", round, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        value: u32,
    }

    fn info(self_id: &str, other_id: &str) -> SessionInfo {
        SessionInfo {
            protocol_id: "test/session",
            final_round: 3,
            self_id: self_id.into(),
            party_ids: [self_id.into(), other_id.into()],
            threshold: 1,
            group: Group::Secp256k1,
        }
    }

    fn challenge(mut transcript: Transcript) -> [u8; 32] {
        let mut out = [0u8; 32];
        transcript.challenge_bytes(b"test", &mut out);
        out
    }

    #[test]
    fn test_rejects_bad_session_id() {
        assert!(matches!(
            Session::new(info("A", "B"), &[0u8; 16]),
            Err(Error::Setup(_))
        ));
        assert!(Session::new(info("A", "B"), &[0u8; 32]).is_ok());
    }

    #[test]
    fn test_rejects_bad_party_ids() {
        assert!(matches!(
            Session::new(info("A", "A"), &[0u8; 32]),
            Err(Error::Setup(_))
        ));
        assert!(matches!(
            Session::new(info("", "B"), &[0u8; 32]),
            Err(Error::Setup(_))
        ));

        let mut bad = info("A", "B");
        bad.threshold = 2;
        assert!(matches!(Session::new(bad, &[0u8; 32]), Err(Error::Setup(_))));
    }

    #[test]
    fn test_both_parties_share_a_transcript() {
        let a = Session::new(info("A", "B"), &[1u8; 32]).unwrap();
        let b = Session::new(info("B", "A"), &[1u8; 32]).unwrap();
        assert_eq!(challenge(a.hash()), challenge(b.hash()));

        let other = Session::new(info("A", "B"), &[2u8; 32]).unwrap();
        assert_ne!(challenge(a.hash()), challenge(other.hash()));
        assert_ne!(
            challenge(a.hash_for_id(&"A".into())),
            challenge(a.hash_for_id(&"B".into()))
        );
    }

    #[test]
    fn test_message_envelope_checks() {
        let a = Session::new(info("A", "B"), &[0u8; 32]).unwrap();
        let b = Session::new(info("B", "A"), &[0u8; 32]).unwrap();

        let msg = a.message(2, &Ping { value: 9 }).unwrap();
        let ping: Ping = b.receive(2, Some(&msg)).unwrap();
        assert_eq!(ping, Ping { value: 9 });

        assert!(matches!(b.receive::<Ping>(3, Some(&msg)), Err(Error::Protocol(_))));
        assert!(matches!(b.receive::<Ping>(2, None), Err(Error::Protocol(_))));
        // Our own message reflected back
        assert!(matches!(a.receive::<Ping>(2, Some(&msg)), Err(Error::Protocol(_))));

        let mut garbled = msg.clone();
        garbled.data = b"{not json".to_vec();
        assert!(matches!(b.receive::<Ping>(2, Some(&garbled)), Err(Error::Protocol(_))));
    }
}
