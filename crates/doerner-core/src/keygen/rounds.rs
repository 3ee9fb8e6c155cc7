//! Round handlers
//!
//! Each round owns exactly the state needed to produce its output and is
//! consumed by value when it finishes, handing its setup object on to the next
//! round.

use super::{
    commitment::{KeygenCommit, KeygenDecommit},
    config::Config,
    messages::{KeygenRound2Message, KeygenRound3Message},
};
use crate::{
    oblivious::{CorreOtSetup, SetupStep},
    proof::SchnorrProof,
    Error, Message, PartyId, PartyRole, Point, Result, Scalar, Session,
};
use merlin::Transcript;
use rand_core::CryptoRngCore;
use rayon::ThreadPool;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use zeroize::Zeroizing;

/// Transcript a key contribution proof is made under
///
/// The sender moves last in the OT setup, so its proof also covers the setup
/// digest; a receiver whose view of the setup differs cannot verify it.
fn proof_transcript(
    session: &Session,
    prover: &PartyId,
    role: PartyRole,
    setup_digest: Option<[u8; 32]>,
) -> Transcript {
    let mut transcript = session.hash_for_id(prover);
    transcript.append_message(b"keygen proof role", role.label());
    if let Some(digest) = setup_digest {
        transcript.append_message(b"setup digest", &digest);
    }
    transcript
}

fn setup_digest_for<S: CorreOtSetup>(setup: &S, role: PartyRole) -> Option<[u8; 32]> {
    (role == PartyRole::Sender).then(|| setup.transcript_digest())
}

/// Scalar both parties derive from the finished setup
///
/// The offset is public: anyone holding the transcript can recompute it. It
/// adds no secrecy and only ties each share to this particular setup.
fn setup_tweak(session: &Session, digest: &[u8; 32]) -> Scalar {
    let mut transcript = session.hash();
    transcript.append_message(b"keygen setup digest", digest);
    let mut wide = [0u8; 64];
    transcript.challenge_bytes(b"keygen share tweak", &mut wide);
    Scalar::from_wide_bytes(&wide)
}

/// Round 1: start the OT setup and commit to a key contribution
pub struct Round1<S: CorreOtSetup> {
    session: Session,
    setup: S,
}

impl<S: CorreOtSetup> Round1<S> {
    pub(crate) fn new(session: Session, pool: Arc<ThreadPool>) -> Self {
        let setup = S::new(pool, session.hash());
        Self { session, setup }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Needs no peer input
    #[instrument(skip_all, fields(party = %self.session.self_id(), role = %S::ROLE))]
    pub fn finalize<R: CryptoRngCore + ?Sized>(
        mut self,
        rng: &mut R,
    ) -> Result<(Round2<S>, Message)> {
        debug!("Keygen round 1: setup and commitment");

        let setup = self.setup.advance(rng, SetupStep::One, &[])?;

        let secret = Zeroizing::new(Scalar::random(rng));
        let decommit = KeygenDecommit::new(rng, Point::act_on_base(&secret));
        let commitment = decommit.commit(&self.session, self.session.self_id(), S::ROLE);

        let message = self
            .session
            .message(2, &KeygenRound2Message { setup, commitment })?;

        let next = Round2 {
            session: self.session,
            setup: self.setup,
            secret,
            decommit,
        };
        Ok((next, message))
    }
}

/// Round 2: advance the setup and open the commitment
pub struct Round2<S: CorreOtSetup> {
    session: Session,
    setup: S,
    secret: Zeroizing<Scalar>,
    decommit: KeygenDecommit,
}

impl<S: CorreOtSetup> Round2<S> {
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[instrument(skip_all, fields(party = %self.session.self_id(), role = %S::ROLE))]
    pub fn finalize<R: CryptoRngCore + ?Sized>(
        mut self,
        rng: &mut R,
        incoming: Option<&Message>,
    ) -> Result<(Round3<S>, Message)> {
        debug!("Keygen round 2: setup and decommitment");

        let peer: KeygenRound2Message = self.session.receive(2, incoming)?;
        let setup = self.setup.advance(rng, SetupStep::Two, &peer.setup)?;

        let transcript = proof_transcript(
            &self.session,
            self.session.self_id(),
            S::ROLE,
            setup_digest_for(&self.setup, S::ROLE),
        );
        let proof =
            SchnorrProof::prove(rng, &transcript, &self.decommit.public_share, &self.secret);

        let message = self.session.message(
            3,
            &KeygenRound3Message {
                setup,
                public_share: self.decommit.public_share,
                nonce: self.decommit.nonce,
                proof,
            },
        )?;

        let next = Round3 {
            session: self.session,
            setup: self.setup,
            secret: self.secret,
            public_share: self.decommit.public_share,
            peer_commitment: peer.commitment,
        };
        Ok((next, message))
    }
}

/// Round 3: check the peer's opening, seal the setup and derive the key share
pub struct Round3<S: CorreOtSetup> {
    session: Session,
    setup: S,
    secret: Zeroizing<Scalar>,
    public_share: Point,
    peer_commitment: KeygenCommit,
}

impl<S: CorreOtSetup> Round3<S> {
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[instrument(skip_all, fields(party = %self.session.self_id(), role = %S::ROLE))]
    pub fn finalize<R: CryptoRngCore + ?Sized>(
        mut self,
        rng: &mut R,
        incoming: Option<&Message>,
    ) -> Result<Config<S::Output>> {
        debug!("Keygen round 3: verification");

        let peer: KeygenRound3Message = self.session.receive(3, incoming)?;
        let trailing = self.setup.advance(rng, SetupStep::Three, &peer.setup)?;
        debug_assert!(trailing.is_empty(), "setup emitted data after its last step");

        let peer_id = self.session.other_id().clone();
        let peer_role = S::ROLE.other();

        if peer.public_share.is_identity() {
            error!(party = %peer_id, "peer key contribution is the identity");
            return Err(Error::Protocol(format!(
                "public share from {} is the identity",
                peer_id
            )));
        }

        let opening = KeygenDecommit {
            public_share: peer.public_share,
            nonce: peer.nonce,
        };
        opening.verify(&self.session, &peer_id, peer_role, &self.peer_commitment)?;

        let transcript = proof_transcript(
            &self.session,
            &peer_id,
            peer_role,
            setup_digest_for(&self.setup, peer_role),
        );
        if !peer.proof.verify(&transcript, &peer.public_share) {
            error!(party = %peer_id, "proof of key contribution failed to verify");
            return Err(Error::Consistency(format!(
                "proof of key contribution from {} is invalid",
                peer_id
            )));
        }

        let digest = self.setup.transcript_digest();
        let setup = self.setup.finalize()?;

        // The sender adds the tweak and the receiver subtracts it, so the sum
        // of the shares is unchanged
        let sign = match S::ROLE {
            PartyRole::Sender => Scalar::one(),
            PartyRole::Receiver => Scalar::from_i64(-1),
        };
        let tweak = setup_tweak(&self.session, &digest);
        let secret_share = Scalar::multiply_add(&sign, &tweak, &self.secret);

        let public = self.public_share.add(&peer.public_share);
        if public.is_identity() {
            error!("shared public key is the identity");
            return Err(Error::Consistency("shared public key is the identity".into()));
        }

        info!(
            party = %self.session.self_id(),
            role = %S::ROLE,
            public_key = hex::encode(public.to_bytes()),
            "Keygen completed successfully"
        );

        Ok(Config::new(setup, secret_share, public))
    }
}
