//! Outstanding requests awaiting their correlated response.

use audiocloud_core::protocol::{CorrelationKey, SocketMessage};
use dashmap::DashMap;
use tokio::sync::oneshot;

/// Map of pending requests, keyed by expected response kind and request id.
///
/// Each entry is consumed exactly once: by the matching response or by the
/// caller giving up. Whichever removes it first wins.
#[derive(Debug, Default)]
pub struct PendingRequests {
    entries: DashMap<CorrelationKey, oneshot::Sender<SocketMessage>>,
}

impl PendingRequests {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` and return the receiver its response will arrive on.
    pub fn register(&self, key: CorrelationKey) -> oneshot::Receiver<SocketMessage> {
        let (tx, rx) = oneshot::channel();
        let _ = self.entries.insert(key, tx);
        rx
    }

    /// Hand `message` to the request waiting on `key`.
    ///
    /// Returns `false` if nobody is waiting (timed out, or never asked).
    pub fn resolve(&self, key: &CorrelationKey, message: SocketMessage) -> bool {
        match self.entries.remove(key) {
            Some((_, tx)) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Forget `key`; returns whether it was still pending.
    pub fn remove(&self, key: &CorrelationKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use audiocloud_core::ids::RequestId;
    use audiocloud_core::protocol::MessageKind;
    use audiocloud_core::result::RemoteResult;

    use super::*;

    fn key(id: &str) -> CorrelationKey {
        CorrelationKey::new(MessageKind::ModifyTaskSpecResponse, RequestId::from(id))
    }

    fn response(id: &str, version: u64) -> SocketMessage {
        SocketMessage::ModifyTaskSpecResponse {
            request_id: RequestId::from(id),
            result: RemoteResult::Ok(version),
        }
    }

    #[tokio::test]
    async fn resolve_delivers_once() {
        let pending = PendingRequests::new();
        let rx = pending.register(key("a"));
        assert!(pending.resolve(&key("a"), response("a", 3)));
        assert!(!pending.resolve(&key("a"), response("a", 4)));
        assert_eq!(rx.await.unwrap(), response("a", 3));
        assert!(pending.is_empty());
    }

    #[test]
    fn removed_entry_ignores_late_response() {
        let pending = PendingRequests::new();
        let _rx = pending.register(key("a"));
        assert!(pending.remove(&key("a")));
        assert!(!pending.remove(&key("a")));
        assert!(!pending.resolve(&key("a"), response("a", 1)));
    }

    #[test]
    fn keys_are_independent() {
        let pending = PendingRequests::new();
        let _a = pending.register(key("a"));
        let _b = pending.register(key("b"));
        assert!(pending.resolve(&key("b"), response("b", 1)));
        assert_eq!(pending.len(), 1);
    }
}
