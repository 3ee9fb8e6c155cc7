//! MPC coordination utilities
//!
//! The keygen state machine never waits for anything; this module supplies the
//! waiting. A [`Relay`] moves [`Message`]s between the two parties and
//! [`run_keygen`] pumps a [`Keygen`] over it until it terminates.

use crate::{Keygen, KeygenOutput, KeygenStep, Message, PartyId, Result, SessionId};
use rand_core::CryptoRngCore;
use tracing::{debug, info, instrument};

pub use ::async_trait::async_trait;

/// Message relay trait for two-party communication
#[async_trait]
pub trait Relay: Send + Sync {
    /// Deliver a message to `message.to`
    async fn send(&self, session_id: &SessionId, message: &Message) -> Result<()>;

    /// Wait for the message addressed to `to` for `round`
    async fn receive(&self, session_id: &SessionId, round: u32, to: &PartyId) -> Result<Message>;
}

/// In-memory relay for testing
pub mod memory;

pub use memory::MemoryRelay;

/// Drive one party's key generation to completion over `relay`
///
/// Any error aborts the run; the session must be restarted with a fresh
/// session id.
#[instrument(skip_all, fields(party = %keygen.self_id(), role = %keygen.role()))]
pub async fn run_keygen<T, R>(mut keygen: Keygen, relay: &T, rng: &mut R) -> Result<KeygenOutput>
where
    T: Relay + ?Sized,
    R: CryptoRngCore + Send + ?Sized,
{
    let session_id = *keygen.session().session_id();
    let self_id = keygen.self_id().clone();
    let mut incoming: Option<Message> = None;

    loop {
        match keygen.proceed(rng, incoming.as_ref())? {
            KeygenStep::Continue(next, outgoing) => {
                debug!(round = outgoing.round, to = %outgoing.to, "sending message");
                relay.send(&session_id, &outgoing).await?;
                incoming = Some(relay.receive(&session_id, next.number(), &self_id).await?);
                keygen = next;
            }
            KeygenStep::Done(output) => {
                info!(
                    public_key = hex::encode(output.public().to_bytes()),
                    "Keygen run finished"
                );
                return Ok(output);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{start_keygen, Error, Group, PartyRole, Point};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use std::{sync::Arc, time::Duration};

    fn pool() -> Arc<rayon::ThreadPool> {
        Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap())
    }

    fn party(role: PartyRole, sid: &SessionId) -> Keygen {
        let (me, peer) = match role {
            PartyRole::Sender => ("A", "B"),
            PartyRole::Receiver => ("B", "A"),
        };
        start_keygen(Group::Secp256k1, role, me.into(), peer.into(), pool(), sid).unwrap()
    }

    #[tokio::test]
    async fn test_run_keygen_over_memory_relay() {
        let relay = MemoryRelay::new();
        let sid = [11u8; 32];
        let mut rng_a = ChaCha20Rng::from_seed([1u8; 32]);
        let mut rng_b = ChaCha20Rng::from_seed([2u8; 32]);

        let (alice, bob) = tokio::join!(
            run_keygen(party(PartyRole::Sender, &sid), &relay, &mut rng_a),
            run_keygen(party(PartyRole::Receiver, &sid), &relay, &mut rng_b),
        );
        let (alice, bob) = (alice.unwrap(), bob.unwrap());

        assert_eq!(alice.public(), bob.public());
        let sum = alice.secret_share().add(bob.secret_share());
        assert_eq!(Point::act_on_base(&sum), *alice.public());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_do_not_mix() {
        let relay = MemoryRelay::new();
        let (sid1, sid2) = ([1u8; 32], [2u8; 32]);
        let mut rngs: Vec<ChaCha20Rng> = (0..4u8)
            .map(|i| ChaCha20Rng::from_seed([i; 32]))
            .collect();
        let [r0, r1, r2, r3] = &mut rngs[..] else {
            unreachable!()
        };

        let (a1, b1, a2, b2) = tokio::join!(
            run_keygen(party(PartyRole::Sender, &sid1), &relay, r0),
            run_keygen(party(PartyRole::Receiver, &sid1), &relay, r1),
            run_keygen(party(PartyRole::Sender, &sid2), &relay, r2),
            run_keygen(party(PartyRole::Receiver, &sid2), &relay, r3),
        );

        assert_eq!(a1.unwrap().public(), b1.unwrap().public());
        assert_eq!(a2.unwrap().public(), b2.unwrap().public());
    }

    #[tokio::test]
    async fn test_missing_peer_times_out() {
        let relay = MemoryRelay::with_timeout(Duration::from_millis(50));
        let sid = [3u8; 32];
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);

        let result = run_keygen(party(PartyRole::Sender, &sid), &relay, &mut rng).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
