//! Two-party message relay

use crate::{PartyId, Result, SessionId};
use serde::{de::DeserializeOwned, Serialize};

pub use ::async_trait::async_trait;

/// Point-to-point message relay between the two setup parties
#[async_trait]
pub trait Relay: Send + Sync {
    /// Send a message for `round` to party `to`
    async fn send_direct<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: u32,
        to: PartyId,
        message: &T,
    ) -> Result<()>;

    /// Wait for the message for `round` addressed to this party
    async fn collect_direct<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: u32,
        my_id: PartyId,
    ) -> Result<T>;
}

/// In-memory relay for testing
pub mod memory;

pub use memory::MemoryRelay;
