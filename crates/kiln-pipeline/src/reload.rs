//! Live-reload broadcasting.
//!
//! The coordinator hands every successful run to a [`ReloadNotifier`]. The
//! production notifier is [`ReloadBroadcaster`], a registry of connected
//! browser clients fed through bounded channels. The HTTP side (SSE endpoint)
//! lives in the CLI crate and only registers/unregisters clients here.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};

/// What the browser should refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadScope {
    /// Swap stylesheets in place
    Css,
    /// Re-fetch images
    Image,
    /// Reload the whole page
    Full,
}

impl fmt::Display for ReloadScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadScope::Css => write!(f, "css"),
            ReloadScope::Image => write!(f, "image"),
            ReloadScope::Full => write!(f, "full"),
        }
    }
}

/// Signal that a pipeline has written new output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "reload")]
pub struct ReloadNotification {
    /// Pipeline that produced the output
    pub pipeline: String,
    /// Asset kind hint for the client
    pub scope: ReloadScope,
    /// Written files, relative to the output root
    pub files: Vec<PathBuf>,
}

/// Sink for reload notifications.
#[async_trait]
pub trait ReloadNotifier: Send + Sync {
    /// Deliver `notification` to every currently connected client.
    async fn notify(&self, notification: ReloadNotification);
}

/// Client registry that fans reload notifications out to browsers.
///
/// Each client gets its own bounded channel of JSON messages. Sending never
/// waits: a client whose receiver has gone away, or whose buffer is full
/// because it stopped reading, is pruned. Its SSE stream then ends and the
/// browser reconnects.
pub struct ReloadBroadcaster {
    clients: RwLock<HashMap<usize, mpsc::Sender<String>>>,
    next_client_id: AtomicUsize,
    buffer: usize,
}

impl ReloadBroadcaster {
    /// Create an empty broadcaster with a per-client buffer of 100 messages.
    pub fn new() -> Self {
        Self::with_buffer(100)
    }

    /// Create an empty broadcaster with a custom per-client buffer.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_client_id: AtomicUsize::new(0),
            buffer: buffer.max(1),
        }
    }

    /// Register a new client.
    ///
    /// # Returns
    ///
    /// Client ID and the receiver its messages arrive on
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.clients.write().insert(id, tx);
        tracing::debug!(client = id, "reload client connected");
        (id, rx)
    }

    /// Remove a client from the registry.
    pub fn unregister_client(&self, id: usize) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!(client = id, "reload client disconnected");
        }
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send a raw JSON message to every client, pruning closed and stalled
    /// ones.
    ///
    /// # Returns
    ///
    /// Number of clients the message was delivered to
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        let mut dropped = Vec::new();
        for (id, tx) in self.clients.read().iter() {
            match tx.try_send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(client = id, "reload client stopped reading; dropping it");
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => dropped.push(*id),
            }
        }

        for id in dropped {
            self.unregister_client(id);
        }
        delivered
    }
}

impl Default for ReloadBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReloadNotifier for ReloadBroadcaster {
    async fn notify(&self, notification: ReloadNotification) {
        let message = match serde_json::to_string(&notification) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to serialize reload notification: {}", e);
                return;
            }
        };

        let delivered = self.broadcast(&message);
        tracing::debug!(
            pipeline = %notification.pipeline,
            scope = %notification.scope,
            clients = delivered,
            "reload broadcast"
        );
    }
}
