//! In-memory relay implementation for testing

use super::{async_trait, Relay};
use crate::{Error, Message, PartyId, Result, SessionId};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;

/// In-memory message relay for local testing
pub struct MemoryRelay {
    /// Pending messages: (session_id, round, to) -> message_bytes
    messages: Arc<DashMap<(SessionId, u32, PartyId), Vec<u8>>>,
    /// Notification channel
    notify: broadcast::Sender<()>,
    /// How long `receive` waits before giving up
    timeout: Option<Duration>,
}

impl MemoryRelay {
    /// Create a new in-memory relay that waits indefinitely
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(100);
        Self {
            messages: Arc::new(DashMap::new()),
            notify,
            timeout: None,
        }
    }

    /// Create a relay whose `receive` fails with [`Error::Timeout`] after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::new()
        }
    }

    async fn wait_for(&self, key: (SessionId, u32, PartyId)) -> Result<Message> {
        let mut rx = self.notify.subscribe();

        loop {
            if let Some((_, bytes)) = self.messages.remove(&key) {
                return serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Deserialization(e.to_string()));
            }

            // Wait for notification, polling as a fallback
            tokio::select! {
                _ = rx.recv() => continue,
                _ = tokio::time::sleep(Duration::from_millis(100)) => continue,
            }
        }
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Relay for MemoryRelay {
    async fn send(&self, session_id: &SessionId, message: &Message) -> Result<()> {
        let bytes = serde_json::to_vec(message)?;
        match self
            .messages
            .entry((*session_id, message.round, message.to.clone()))
        {
            Entry::Occupied(_) => {
                return Err(Error::Relay(format!(
                    "duplicate round {} message for {}",
                    message.round, message.to
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(bytes);
            }
        }

        let _ = self.notify.send(());
        Ok(())
    }

    async fn receive(&self, session_id: &SessionId, round: u32, to: &PartyId) -> Result<Message> {
        let wait = self.wait_for((*session_id, round, to.clone()));
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                Error::Timeout(format!("round {} message for {}", round, to))
            })?,
            None => wait.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(round: u32, data: &[u8]) -> Message {
        Message {
            from: "A".into(),
            to: "B".into(),
            round,
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_send_receive() {
        let relay = MemoryRelay::new();
        let session_id = [0u8; 32];

        relay.send(&session_id, &message(2, b"hello")).await.unwrap();
        relay.send(&session_id, &message(3, b"world")).await.unwrap();

        let third = relay.receive(&session_id, 3, &"B".into()).await.unwrap();
        let second = relay.receive(&session_id, 2, &"B".into()).await.unwrap();

        assert_eq!(second, message(2, b"hello"));
        assert_eq!(third.data, b"world");
    }

    #[tokio::test]
    async fn test_receive_waits_for_send() {
        let relay = Arc::new(MemoryRelay::new());
        let session_id = [1u8; 32];

        let waiter = {
            let relay = relay.clone();
            tokio::spawn(async move { relay.receive(&session_id, 2, &"B".into()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        relay.send(&session_id, &message(2, b"late")).await.unwrap();

        assert_eq!(waiter.await.unwrap().unwrap().data, b"late");
    }

    #[tokio::test]
    async fn test_duplicate_send_rejected() {
        let relay = MemoryRelay::new();
        let session_id = [2u8; 32];

        relay.send(&session_id, &message(2, b"one")).await.unwrap();
        let dup = relay.send(&session_id, &message(2, b"two")).await;
        assert!(matches!(dup, Err(Error::Relay(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_sends_accept_one() {
        let relay = Arc::new(MemoryRelay::new());
        let session_id = [4u8; 32];

        let sends: Vec<_> = (0..16u8)
            .map(|i| {
                let relay = relay.clone();
                tokio::spawn(async move { relay.send(&session_id, &message(2, &[i])).await })
            })
            .collect();

        let mut accepted = 0;
        for send in sends {
            if send.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    async fn test_receive_timeout() {
        let relay = MemoryRelay::with_timeout(Duration::from_millis(20));
        let result = relay.receive(&[3u8; 32], 2, &"B".into()).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
