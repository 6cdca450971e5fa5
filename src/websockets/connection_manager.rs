use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Registry of live connections, keyed by connection id.
///
/// Broadcast fan-out happens on the event bus; this only carries messages
/// addressed to a single connection (join results, move rejections, and
/// each connection's redacted view of a broadcast).
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, connection_id: &str);

    async fn send_to_connection(&self, connection_id: &str, message: &str);
}

pub struct InMemoryConnectionManager {
    // connection_id -> sender
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, sender);
    }

    async fn remove_connection(&self, connection_id: &str) {
        let mut connections = self.connections.write().await;
        connections.remove(connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(sender) = connections.get(connection_id) {
            // A failed send means the receiver task already exited; the
            // disconnect path cleans the entry up.
            if sender.send(message.to_string()).is_err() {
                debug!(connection_id = %connection_id, "Send to closed connection dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_registered_connection() {
        let manager = InMemoryConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        manager.add_connection("conn-1".to_string(), tx).await;
        assert_eq!(manager.connection_count().await, 1);

        manager.send_to_connection("conn-1", "hello").await;
        assert_eq!(rx.recv().await.unwrap(), "hello");

        // Unknown targets are ignored.
        manager.send_to_connection("conn-2", "lost").await;

        manager.remove_connection("conn-1").await;
        assert_eq!(manager.connection_count().await, 0);
    }
}
