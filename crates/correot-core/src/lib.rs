//! # CorreOT Core
//!
//! Setup phase of correlated oblivious transfer (COT) extension, as used
//! inside threshold ECDSA/Schnorr signing.
//!
//! This crate provides:
//! - Domain-separated hashing for binding sub-protocols to their own transcript
//! - Verified random OT over secp256k1 (the base OT)
//! - The three-round correlated OT setup handshake
//!
//! ## Protocol Overview
//!
//! The COT sender samples a secret κ-bit string Delta and runs κ base OTs as
//! the base OT *receiver*, choosing bit `i` of Delta in instance `i`. The COT
//! receiver plays the base OT *sender* and learns both seeds `K_0[i]`,
//! `K_1[i]`, while the COT sender learns `K_Delta[i] = K_{Delta_i}[i]`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use correot_core::{setup, Group, MemoryRelay, SessionConfig, SetupParams};
//!
//! let relay = MemoryRelay::new();
//! let (send_out, receive_out) = tokio::join!(
//!     setup::run_cot_sender_setup(&sender_config, &relay, &mut OsRng),
//!     setup::run_cot_receiver_setup(&receiver_config, Group::Secp256k1, &relay, &mut OsRng),
//! );
//! assert!(send_out?.is_correlated_with(&receive_out?));
//! ```

pub mod error;
pub mod hash;
pub mod mpc;
pub mod oblivious;
pub mod params;
pub mod setup;
pub mod types;

pub use error::{Error, Result};
pub use hash::DomainHash;
pub use mpc::{MemoryRelay, Relay};
pub use oblivious::{CorreOtSetupReceiver, CorreOtSetupSender, Group};
pub use params::{SetupParams, DEFAULT_SEC_PARAM};
pub use types::{CorreOtReceiveSetup, CorreOtSendSetup, Key, PartyId, SessionConfig, SessionId};

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
