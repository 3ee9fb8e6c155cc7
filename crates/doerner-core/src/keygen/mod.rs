//! Two-party key generation
//!
//! A three-round protocol between a correlated OT sender ("Alice") and a
//! correlated OT receiver ("Bob"). Both parties run the OT setup alongside key
//! generation; its result is kept in the final [`Config`] for signing.
//!
//! Each party holds exactly one state object. Round 1 needs no peer input,
//! rounds 2 and 3 each consume the peer's message for that round:
//!
//! 1. Start the OT setup, sample `x_i`, commit to `X_i = x_i * G`.
//! 2. Advance the OT setup, open the commitment and prove knowledge of `x_i`.
//! 3. Check the opening and proof, seal the OT setup and derive the share.
//!
//! The caller moves messages between the parties; nothing in this module
//! blocks or waits.

mod commitment;
mod config;
mod messages;
mod rounds;

pub use commitment::KeygenCommit;
pub use config::{Config, ConfigReceiver, ConfigSender};
pub use messages::{KeygenRound2Message, KeygenRound3Message};
pub use rounds::{Round1, Round2, Round3};

use crate::{
    oblivious::{CorreOtSetup, CorreOtSetupReceiver, CorreOtSetupSender},
    Error, Group, Message, PartyId, PartyRole, Point, Result, Scalar, Session, SessionInfo,
    FINAL_ROUND, PROTOCOL_ID, THRESHOLD,
};
use rand_core::CryptoRngCore;
use rayon::ThreadPool;
use std::sync::Arc;
use tracing::{error, info};

/// Key generation state for one role
pub enum KeygenRound<S: CorreOtSetup> {
    One(Round1<S>),
    Two(Round2<S>),
    Three(Round3<S>),
}

/// Outcome of driving a [`KeygenRound`] once
pub enum Transition<S: CorreOtSetup> {
    /// The next round, and the message the peer needs for it
    Continue {
        next: KeygenRound<S>,
        outgoing: Message,
    },
    /// Terminal round finished
    Done(Config<S::Output>),
}

impl<S: CorreOtSetup> KeygenRound<S> {
    /// Number of the round this state runs next
    pub fn number(&self) -> u32 {
        match self {
            KeygenRound::One(_) => 1,
            KeygenRound::Two(_) => 2,
            KeygenRound::Three(_) => 3,
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            KeygenRound::One(r) => r.session(),
            KeygenRound::Two(r) => r.session(),
            KeygenRound::Three(r) => r.session(),
        }
    }

    /// Run the current round
    ///
    /// `incoming` is the peer's message for this round; round 1 takes none.
    pub fn proceed<R: CryptoRngCore + ?Sized>(
        self,
        rng: &mut R,
        incoming: Option<&Message>,
    ) -> Result<Transition<S>> {
        match self {
            KeygenRound::One(round) => {
                if let Some(msg) = incoming {
                    error!(round = msg.round, "round 1 takes no peer message");
                    return Err(Error::Protocol(format!(
                        "unexpected message for round {} before round 1",
                        msg.round
                    )));
                }
                let (next, outgoing) = round.finalize(rng)?;
                Ok(Transition::Continue {
                    next: KeygenRound::Two(next),
                    outgoing,
                })
            }
            KeygenRound::Two(round) => {
                let (next, outgoing) = round.finalize(rng, incoming)?;
                Ok(Transition::Continue {
                    next: KeygenRound::Three(next),
                    outgoing,
                })
            }
            KeygenRound::Three(round) => Ok(Transition::Done(round.finalize(rng, incoming)?)),
        }
    }
}

/// Key generation state machine for either role
pub enum Keygen {
    Sender(KeygenRound<CorreOtSetupSender>),
    Receiver(KeygenRound<CorreOtSetupReceiver>),
}

/// Outcome of driving [`Keygen`] once
pub enum KeygenStep {
    Continue(Keygen, Message),
    Done(KeygenOutput),
}

/// Terminal key generation output for either role
#[derive(Debug, Clone)]
pub enum KeygenOutput {
    Sender(ConfigSender),
    Receiver(ConfigReceiver),
}

impl KeygenOutput {
    pub fn role(&self) -> PartyRole {
        match self {
            KeygenOutput::Sender(_) => PartyRole::Sender,
            KeygenOutput::Receiver(_) => PartyRole::Receiver,
        }
    }

    pub fn public(&self) -> &Point {
        match self {
            KeygenOutput::Sender(c) => c.public(),
            KeygenOutput::Receiver(c) => c.public(),
        }
    }

    pub fn secret_share(&self) -> &Scalar {
        match self {
            KeygenOutput::Sender(c) => c.secret_share(),
            KeygenOutput::Receiver(c) => c.secret_share(),
        }
    }

    pub fn group(&self) -> Group {
        self.public().group()
    }
}

impl Keygen {
    pub fn role(&self) -> PartyRole {
        match self {
            Keygen::Sender(_) => PartyRole::Sender,
            Keygen::Receiver(_) => PartyRole::Receiver,
        }
    }

    /// Number of the round this state runs next
    pub fn number(&self) -> u32 {
        match self {
            Keygen::Sender(r) => r.number(),
            Keygen::Receiver(r) => r.number(),
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            Keygen::Sender(r) => r.session(),
            Keygen::Receiver(r) => r.session(),
        }
    }

    pub fn self_id(&self) -> &PartyId {
        self.session().self_id()
    }

    /// Run the current round, see [`KeygenRound::proceed`]
    pub fn proceed<R: CryptoRngCore + ?Sized>(
        self,
        rng: &mut R,
        incoming: Option<&Message>,
    ) -> Result<KeygenStep> {
        match self {
            Keygen::Sender(round) => Ok(match round.proceed(rng, incoming)? {
                Transition::Continue { next, outgoing } => {
                    KeygenStep::Continue(Keygen::Sender(next), outgoing)
                }
                Transition::Done(config) => KeygenStep::Done(KeygenOutput::Sender(config)),
            }),
            Keygen::Receiver(round) => Ok(match round.proceed(rng, incoming)? {
                Transition::Continue { next, outgoing } => {
                    KeygenStep::Continue(Keygen::Receiver(next), outgoing)
                }
                Transition::Done(config) => KeygenStep::Done(KeygenOutput::Receiver(config)),
            }),
        }
    }
}

/// Create the round-1 state for one party
///
/// # Arguments
/// * `group` - Group the key lives in
/// * `role` - Whether this party is the OT sender or receiver
/// * `self_id` / `other_id` - Identifiers of this party and its peer
/// * `pool` - Thread pool shared with the OT setup
/// * `session_id` - 32 bytes, identical on both sides and fresh per run
pub fn start_keygen(
    group: Group,
    role: PartyRole,
    self_id: PartyId,
    other_id: PartyId,
    pool: Arc<ThreadPool>,
    session_id: &[u8],
) -> Result<Keygen> {
    let info = SessionInfo {
        protocol_id: PROTOCOL_ID,
        final_round: FINAL_ROUND,
        self_id: self_id.clone(),
        party_ids: [self_id, other_id],
        threshold: THRESHOLD,
        group,
    };
    let session = Session::new(info, session_id)?;

    info!(
        party = %session.self_id(),
        peer = %session.other_id(),
        %role,
        %group,
        session_id = hex::encode(session.session_id()),
        "Starting keygen"
    );

    Ok(match role {
        PartyRole::Sender => Keygen::Sender(KeygenRound::One(Round1::new(session, pool))),
        PartyRole::Receiver => Keygen::Receiver(KeygenRound::One(Round1::new(session, pool))),
    })
}
