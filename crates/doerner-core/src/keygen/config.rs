//! Terminal key generation output

use crate::{
    oblivious::{CorreOtReceiveSetup, CorreOtSendSetup},
    Group, Point, Scalar,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Result of key generation for one party
///
/// The two parties' secret shares add up, mod `q`, to the discrete log of the
/// shared `public` key.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config<S> {
    setup: S,
    secret_share: Scalar,
    public: Point,
}

/// Key generation result for the sender ("Alice")
pub type ConfigSender = Config<CorreOtSendSetup>;

/// Key generation result for the receiver ("Bob")
pub type ConfigReceiver = Config<CorreOtReceiveSetup>;

impl<S> Config<S> {
    pub(crate) fn new(setup: S, secret_share: Scalar, public: Point) -> Self {
        Self {
            setup,
            secret_share,
            public,
        }
    }

    /// Correlated OT setup, needed to perform signing
    pub fn setup(&self) -> &S {
        &self.setup
    }

    /// Additive share of the secret key
    pub fn secret_share(&self) -> &Scalar {
        &self.secret_share
    }

    /// The shared public key
    pub fn public(&self) -> &Point {
        &self.public
    }

    /// The group of the shared public key
    pub fn group(&self) -> Group {
        self.public.group()
    }
}

impl<S> Drop for Config<S> {
    fn drop(&mut self) {
        self.secret_share.zeroize();
    }
}

impl<S: fmt::Debug> fmt::Debug for Config<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("setup", &self.setup)
            .field("secret_share", &self.secret_share)
            .field("public", &hex::encode(self.public.to_bytes()))
            .finish()
    }
}
