//! # Doerner Core
//!
//! Two-party ECDSA key generation over secp256k1, after Doerner, Kondi, Lee
//! and shelat.
//!
//! This crate provides:
//! - Scalar field arithmetic mod the group order
//! - The correlated OT setup that signing later relies on
//! - A three-round key generation state machine producing additive shares
//! - An in-memory relay and async driver for running both parties locally
//!
//! ## Protocol Overview
//!
//! One party plays the correlated OT sender ("Alice"), the other the receiver
//! ("Bob"). Each samples a key contribution `x_i`, commits to `X_i = x_i * G`,
//! and opens the commitment only after the peer has committed. On success
//! both hold the same public key `X_S + X_R` and shares summing to its
//! discrete log.
//!
//! ## Example
//!
//! ```rust,ignore
//! use doerner_core::{keygen::start_keygen, mpc, Group, PartyRole};
//!
//! let keygen = start_keygen(
//!     Group::Secp256k1,
//!     PartyRole::Sender,
//!     "A".into(),
//!     "B".into(),
//!     pool,
//!     &sid,
//! )?;
//! let output = mpc::run_keygen(keygen, &relay, &mut OsRng).await?;
//! ```

pub mod curve;
pub mod error;
pub mod keygen;
pub mod mpc;
pub mod oblivious;
pub mod proof;
pub mod scalar;
pub mod session;
pub mod types;

pub use curve::{Group, Point};
pub use error::{Error, Result};
pub use keygen::{
    start_keygen, Config, ConfigReceiver, ConfigSender, Keygen, KeygenOutput, KeygenStep,
};
pub use scalar::Scalar;
pub use session::{Session, SessionInfo};
pub use types::{Message, PartyId, PartyRole, SessionId};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol identifier absorbed into every session transcript
pub const PROTOCOL_ID: &str = "doerner/keygen";

/// Number of the terminal keygen round
pub const FINAL_ROUND: u32 = 3;

/// Two-of-two only
pub const THRESHOLD: usize = 1;
