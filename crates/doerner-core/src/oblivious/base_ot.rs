//! Base oblivious transfer
//!
//! "Simplest OT" of Chou and Orlandi (https://eprint.iacr.org/2015/267.pdf)
//! over the protocol curve. The base-OT sender publishes `A = a * G`; for each
//! instance the receiver sends `B = b * G + c * A` for its choice bit `c` and
//! learns `H(b * A)`, while the sender can compute both `H(a * B)` and
//! `H(a * (B - A))` without learning which one the receiver holds.

use super::OtKey;
use crate::{Point, Scalar};
use rand_core::CryptoRngCore;
use rayon::{prelude::*, ThreadPool};
use sha2::{Digest, Sha256};
use subtle::Choice;
use zeroize::Zeroize;

const KEY_DOMAIN: &[u8] = b"doerner/base-ot/key";

/// Base-OT sender state
pub(crate) struct BaseOtSender {
    secret: Scalar,
    public: Point,
}

impl BaseOtSender {
    /// Sample the sender's secret `a`
    pub fn new<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Self {
        let secret = Scalar::random(rng);
        let public = Point::act_on_base(&secret);
        Self { secret, public }
    }

    pub fn public(&self) -> &Point {
        &self.public
    }

    pub fn secret(&self) -> &Scalar {
        &self.secret
    }

    /// Derive both keys for every receiver message
    pub fn derive_keys(&self, pool: &ThreadPool, choices: &[Point]) -> Vec<(OtKey, OtKey)> {
        pool.install(|| {
            choices
                .par_iter()
                .enumerate()
                .map(|(i, b)| {
                    let k0 = derive_key(i, &self.public, b, &b.scale(&self.secret));
                    let shifted = b.subtract(&self.public);
                    let k1 = derive_key(i, &self.public, b, &shifted.scale(&self.secret));
                    (k0, k1)
                })
                .collect()
        })
    }
}

impl Drop for BaseOtSender {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

/// Receiver side: produce one message per choice bit and the chosen keys
///
/// Masks are sampled sequentially from `rng`; the point arithmetic runs on
/// `pool` and has completed when this returns.
pub(crate) fn receiver_choose<R: CryptoRngCore + ?Sized>(
    pool: &ThreadPool,
    rng: &mut R,
    sender_public: &Point,
    choices: &[bool],
) -> (Vec<Point>, Vec<OtKey>) {
    let mut masks: Vec<Scalar> = choices.iter().map(|_| Scalar::random(&mut *rng)).collect();
    let identity = Point::identity();

    let result = pool.install(|| {
        masks
            .par_iter()
            .zip(choices.par_iter())
            .enumerate()
            .map(|(i, (mask, choice))| {
                let shift = Point::select(&identity, sender_public, Choice::from(*choice as u8));
                let message = Point::act_on_base(mask).add(&shift);
                let key = derive_key(i, sender_public, &message, &sender_public.scale(mask));
                (message, key)
            })
            .unzip()
    });

    masks.zeroize();
    result
}

fn derive_key(index: usize, sender_public: &Point, message: &Point, shared: &Point) -> OtKey {
    let mut hasher = Sha256::new();
    hasher.update(KEY_DOMAIN);
    hasher.update((index as u64).to_le_bytes());
    hasher.update(sender_public.to_bytes());
    hasher.update(message.to_bytes());
    hasher.update(shared.to_bytes());
    hasher.finalize().into()
}
