//! Notification delivery and identity resolution capabilities
//!
//! The core decides when and to whom a notification goes; delivery belongs to
//! whatever implements [`NotificationDispatcher`]. Failures are reported to the
//! caller, which logs them and carries on.

use crate::error::{RendezvousError, Result};
use crate::notification::events::NotificationEvent;
use crate::types::{ConnectionId, Pid};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Trait for delivering notification events to a connection
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver `event` to `target`
    async fn dispatch(&self, target: ConnectionId, event: NotificationEvent) -> Result<()>;
}

/// Maps a persistent player identity to its current connection
pub trait ConnectionDirectory: Send + Sync {
    fn connection_for(&self, pid: Pid) -> Option<ConnectionId>;
}

/// Connection directory kept in memory by the embedding server
#[derive(Debug, Default)]
pub struct InMemoryConnectionDirectory {
    connections: RwLock<HashMap<Pid, ConnectionId>>,
}

impl InMemoryConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the connection a player is using; a newer login replaces the older one
    pub fn register(&self, pid: Pid, connection_id: ConnectionId) {
        if let Ok(mut connections) = self.connections.write() {
            connections.insert(pid, connection_id);
        }
    }

    /// Forget a connection, if it is still the player's current one
    pub fn unregister(&self, pid: Pid, connection_id: ConnectionId) {
        if let Ok(mut connections) = self.connections.write() {
            if connections.get(&pid) == Some(&connection_id) {
                connections.remove(&pid);
            }
        }
    }
}

impl ConnectionDirectory for InMemoryConnectionDirectory {
    fn connection_for(&self, pid: Pid) -> Option<ConnectionId> {
        self.connections
            .read()
            .ok()
            .and_then(|connections| connections.get(&pid).copied())
    }
}

/// Dispatcher that pushes events into per-connection channels
///
/// The transport side registers a connection and drains the returned
/// receiver. Delivery never waits: a full or closed channel is an error.
#[derive(Debug)]
pub struct ChannelNotificationDispatcher {
    senders: RwLock<HashMap<ConnectionId, mpsc::Sender<NotificationEvent>>>,
    queue_depth: usize,
}

impl ChannelNotificationDispatcher {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Open the event channel for a connection
    pub fn register(&self, connection_id: ConnectionId) -> Result<mpsc::Receiver<NotificationEvent>> {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let mut senders = self
            .senders
            .write()
            .map_err(|_| RendezvousError::InternalError {
                message: "Failed to acquire notification senders lock".to_string(),
            })?;
        senders.insert(connection_id, tx);
        debug!("Registered notification channel for connection {}", connection_id);
        Ok(rx)
    }

    pub fn unregister(&self, connection_id: ConnectionId) {
        if let Ok(mut senders) = self.senders.write() {
            senders.remove(&connection_id);
        }
    }
}

#[async_trait]
impl NotificationDispatcher for ChannelNotificationDispatcher {
    async fn dispatch(&self, target: ConnectionId, event: NotificationEvent) -> Result<()> {
        let sender = {
            let senders = self
                .senders
                .read()
                .map_err(|_| RendezvousError::InternalError {
                    message: "Failed to acquire notification senders lock".to_string(),
                })?;
            senders
                .get(&target)
                .cloned()
                .ok_or_else(|| RendezvousError::NotFound {
                    what: format!("notification channel for connection {}", target),
                })?
        };

        sender.try_send(event).map_err(|e| {
            RendezvousError::InternalError {
                message: format!("Failed to deliver notification to {}: {}", target, e),
            }
            .into()
        })
    }
}

/// Dispatcher that only writes events to the log
#[derive(Debug, Default, Clone)]
pub struct LoggingNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingNotificationDispatcher {
    async fn dispatch(&self, target: ConnectionId, event: NotificationEvent) -> Result<()> {
        info!(
            "Notification to connection {} - type: {}, source: {}, param1: {}, param2: {}, message: {:?}",
            target,
            event.notification_type,
            event.pid_source,
            event.param1,
            event.param2,
            event.str_param
        );
        Ok(())
    }
}

/// Mock dispatcher for testing
#[derive(Debug, Default)]
pub struct MockNotificationDispatcher {
    dispatched: Mutex<Vec<(ConnectionId, NotificationEvent)>>,
    fail: bool,
}

impl MockNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every delivery fails
    pub fn failing() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// All attempted deliveries, in order
    pub fn dispatched(&self) -> Vec<(ConnectionId, NotificationEvent)> {
        self.dispatched
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Deliveries addressed to one connection
    pub fn dispatched_to(&self, target: ConnectionId) -> Vec<NotificationEvent> {
        self.dispatched()
            .into_iter()
            .filter(|(to, _)| *to == target)
            .map(|(_, event)| event)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.dispatched.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn dispatch(&self, target: ConnectionId, event: NotificationEvent) -> Result<()> {
        if let Ok(mut events) = self.dispatched.lock() {
            events.push((target, event));
        }
        if self.fail {
            return Err(RendezvousError::InternalError {
                message: format!("delivery to {} failed", target),
            }
            .into());
        }
        Ok(())
    }
}
