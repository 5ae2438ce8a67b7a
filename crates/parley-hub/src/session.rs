use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::connection::Connection;
use crate::dispatch::{Dispatcher, FanOut};
use crate::registry::Registry;
use crate::types::{ConnId, Payload};

/// Why a connection went away. Teardown is expected, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    ClientClosed,
    StreamEnded,
    TransportError(String),
    PayloadTooLarge,
    /// Nothing heard from the peer, not even a pong, for two heartbeats.
    HeartbeatTimeout,
    SendFailed,
    Shutdown,
    /// Session dropped without an explicit close.
    Dropped,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ClientClosed => f.write_str("client closed"),
            CloseReason::StreamEnded => f.write_str("stream ended"),
            CloseReason::TransportError(e) => write!(f, "transport error: {e}"),
            CloseReason::PayloadTooLarge => f.write_str("payload too large"),
            CloseReason::HeartbeatTimeout => f.write_str("heartbeat timeout"),
            CloseReason::SendFailed => f.write_str("send failed"),
            CloseReason::Shutdown => f.write_str("server shutdown"),
            CloseReason::Dropped => f.write_str("dropped"),
        }
    }
}

/// Lifecycle handle for one registered connection.
///
/// Created by [`Hub::accept`](crate::hub::Hub::accept) already registered.
/// Closing unregisters exactly once, however many close/error paths fire;
/// dropping an unclosed session closes it.
pub struct Session {
    conn: Arc<Connection>,
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
}

impl Session {
    pub(crate) fn new(conn: Arc<Connection>, registry: Arc<Registry>, dispatcher: Dispatcher) -> Self {
        Self {
            conn,
            registry,
            dispatcher,
        }
    }

    pub fn id(&self) -> ConnId {
        self.conn.id()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    /// Inbound message from this connection: broadcast it to everyone,
    /// this connection included. Ignored once the session is closing.
    pub fn on_message(&self, payload: impl Into<Payload>) -> FanOut {
        if !self.conn.is_open() {
            return FanOut::default();
        }
        self.dispatcher
            .on_message(&self.registry, self.conn.id(), &payload.into())
    }

    /// Open -> Closing -> Closed, then unregister. Returns false when the
    /// session was already closed.
    ///
    /// New deliveries are refused from the Closing transition on. Payloads
    /// already queued stay in the receiver; the caller flushes them to the
    /// transport first if it still can, otherwise they go with the queue.
    pub fn close(&self, reason: CloseReason) -> bool {
        if !self.conn.begin_close() {
            return false;
        }
        self.registry.unregister(self.conn.id());
        self.conn.mark_closed();
        info!(conn_id = %self.conn.id(), %reason, "connection closed");
        true
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close(CloseReason::Dropped);
    }
}
