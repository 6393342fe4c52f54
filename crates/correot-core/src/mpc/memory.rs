//! In-memory relay implementation for testing

use super::{async_trait, Relay};
use crate::{Error, PartyId, Result, SessionId};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, time::Instant};

/// Default time to wait for a peer message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// In-memory message relay for local testing
#[derive(Clone)]
pub struct MemoryRelay {
    /// Direct messages: (session_id, round, to) -> queued message bytes
    directs: Arc<DashMap<(SessionId, u32, PartyId), Vec<Vec<u8>>>>,
    /// Notification channel
    notify: broadcast::Sender<()>,
    /// How long `collect_direct` waits before giving up
    timeout: Duration,
}

impl MemoryRelay {
    /// Create a new in-memory relay
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(100);
        Self {
            directs: Arc::new(DashMap::new()),
            notify,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set how long to wait for a message
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn take(&self, key: &(SessionId, u32, PartyId)) -> Option<Vec<u8>> {
        let mut queue = self.directs.get_mut(key)?;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))
}

fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn send_direct<T: Serialize + Send + Sync>(
        &self,
        session_id: &SessionId,
        round: u32,
        to: PartyId,
        message: &T,
    ) -> Result<()> {
        let bytes = serialize(message)?;

        self.directs
            .entry((*session_id, round, to))
            .or_default()
            .push(bytes);

        let _ = self.notify.send(());
        Ok(())
    }

    async fn collect_direct<T: DeserializeOwned + Send>(
        &self,
        session_id: &SessionId,
        round: u32,
        my_id: PartyId,
    ) -> Result<T> {
        let mut rx = self.notify.subscribe();
        let deadline = Instant::now() + self.timeout;
        let key = (*session_id, round, my_id);

        loop {
            if let Some(bytes) = self.take(&key) {
                return deserialize(&bytes);
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "round {} message for party {}",
                    round, my_id
                )));
            }

            // Wait for notification with timeout
            tokio::select! {
                _ = rx.recv() => continue,
                _ = tokio::time::sleep_until(deadline.min(Instant::now() + Duration::from_millis(100))) => continue,
            }
        }
    }
}
