//! Commitment to a party's public key contribution

use crate::{Error, PartyId, PartyRole, Point, Result, Session};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::error;

/// Binding, hiding commitment sent in the round-2 message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenCommit([u8; 32]);

impl KeygenCommit {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Opening of a [`KeygenCommit`], revealed in the round-3 message
#[derive(Debug, Clone)]
pub(crate) struct KeygenDecommit {
    pub public_share: Point,
    pub nonce: [u8; 32],
}

impl KeygenDecommit {
    pub fn new<R: CryptoRngCore + ?Sized>(rng: &mut R, public_share: Point) -> Self {
        let mut nonce = [0u8; 32];
        rng.fill_bytes(&mut nonce);
        Self {
            public_share,
            nonce,
        }
    }

    /// Commit under the session transcript, bound to the committer and its role
    pub fn commit(&self, session: &Session, committer: &PartyId, role: PartyRole) -> KeygenCommit {
        let mut transcript = session.hash_for_id(committer);
        transcript.append_message(b"keygen commit role", role.label());
        transcript.append_message(b"public share", &self.public_share.to_bytes());
        transcript.append_message(b"nonce", &self.nonce);
        let mut hash = [0u8; 32];
        transcript.challenge_bytes(b"keygen commitment", &mut hash);
        KeygenCommit(hash)
    }

    /// Check this opening against a commitment received earlier
    pub fn verify(
        &self,
        session: &Session,
        committer: &PartyId,
        role: PartyRole,
        com: &KeygenCommit,
    ) -> Result<()> {
        let rebuilt = self.commit(session, committer, role);
        if !bool::from(rebuilt.0[..].ct_eq(&com.0[..])) {
            error!(party = %committer, "decommitment does not match original commitment");
            return Err(Error::Consistency(format!(
                "commitment opening from {} does not match",
                committer
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Group, Scalar, SessionInfo};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn session(sid: u8) -> Session {
        let info = SessionInfo {
            protocol_id: "test/commit",
            final_round: 3,
            self_id: "A".into(),
            party_ids: ["A".into(), "B".into()],
            threshold: 1,
            group: Group::Secp256k1,
        };
        Session::new(info, &[sid; 32]).unwrap()
    }

    #[test]
    fn test_opening_verifies() {
        let mut rng = ChaCha20Rng::from_seed([5u8; 32]);
        let session = session(0);
        let share = Point::act_on_base(&Scalar::random(&mut rng));
        let decommit = KeygenDecommit::new(&mut rng, share);
        let com = decommit.commit(&session, &"A".into(), PartyRole::Sender);
        assert!(decommit
            .verify(&session, &"A".into(), PartyRole::Sender, &com)
            .is_ok());
    }

    #[test]
    fn test_opening_is_bound() {
        let mut rng = ChaCha20Rng::from_seed([6u8; 32]);
        let s = session(0);
        let share = Point::act_on_base(&Scalar::random(&mut rng));
        let decommit = KeygenDecommit::new(&mut rng, share);
        let com = decommit.commit(&s, &"A".into(), PartyRole::Sender);

        let wrong_role = decommit.verify(&s, &"A".into(), PartyRole::Receiver, &com);
        assert!(matches!(wrong_role, Err(Error::Consistency(_))));

        let wrong_party = decommit.verify(&s, &"B".into(), PartyRole::Sender, &com);
        assert!(matches!(wrong_party, Err(Error::Consistency(_))));

        let wrong_session = decommit.verify(&session(1), &"A".into(), PartyRole::Sender, &com);
        assert!(matches!(wrong_session, Err(Error::Consistency(_))));

        let mut other = decommit.clone();
        other.public_share = other.public_share.add(&Point::generator());
        let wrong_share = other.verify(&s, &"A".into(), PartyRole::Sender, &com);
        assert!(matches!(wrong_share, Err(Error::Consistency(_))));
    }
}
