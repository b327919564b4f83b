//! Realtime push registry: maps authenticated user identities to their
//! active gateway connection.
//!
//! The binding is connection-local and ephemeral: established when a
//! handshake presents a valid credential, discarded on disconnect, never
//! persisted. Delivery addresses identities, not connection ids: sending to
//! a user with no bound connection is a silent no-op, never an error.
//! Durable storage remains the source of truth; push is best-effort on top.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Receiving side of one connection's outbound channel. The gateway's
/// socket task drains this and writes frames to the client.
pub type PushReceiver = mpsc::UnboundedReceiver<String>;

/// Shared registry of user → connection bindings.
///
/// Cloning is cheap; all clones share the same map. Lock scope is kept to
/// map operations only; sends go through the channel after the lock drops.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<std::sync::Mutex<HashMap<Uuid, Binding>>>,
}

struct Binding {
    /// Distinguishes bindings when a user reconnects: the old socket task's
    /// unbind must not tear down the replacement binding.
    connection_id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a user identity to a fresh connection, replacing any previous
    /// binding (the stale connection's channel closes, ending its drain
    /// task). Returns the connection id and the receiver for the new
    /// connection's outbound frames.
    pub fn bind(&self, user_id: Uuid) -> (Uuid, PushReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::now_v7();
        let mut map = self.inner.lock().expect("registry lock poisoned");
        if map
            .insert(user_id, Binding { connection_id, tx })
            .is_some()
        {
            debug!(user_id = %user_id, "Replaced existing realtime binding");
        }
        (connection_id, rx)
    }

    /// Drop a binding on disconnect. Only removes the entry when it still
    /// belongs to `connection_id`, so a reconnect that already replaced the
    /// binding is left intact.
    pub fn unbind(&self, user_id: Uuid, connection_id: Uuid) {
        let mut map = self.inner.lock().expect("registry lock poisoned");
        if map
            .get(&user_id)
            .is_some_and(|b| b.connection_id == connection_id)
        {
            map.remove(&user_id);
        }
    }

    /// Deliver a JSON frame to the user's bound connection. Returns `true`
    /// when a connection accepted the frame; `false` (silent no-op) when
    /// the user has no live binding.
    pub fn send_to_user(&self, user_id: Uuid, frame: String) -> bool {
        let tx = {
            let map = self.inner.lock().expect("registry lock poisoned");
            map.get(&user_id).map(|b| b.tx.clone())
        };
        match tx {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Number of currently bound connections.
    pub fn active_count(&self) -> usize {
        self.inner.lock().expect("registry lock poisoned").len()
    }
}
