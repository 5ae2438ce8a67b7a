use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parley_core::config::HubConfig;
use tokio::sync::mpsc;
use tracing::error;

use crate::connection::{Connection, Outbound};
use crate::dispatch::{Dispatcher, FanOut};
use crate::error::HubError;
use crate::registry::Registry;
use crate::session::Session;
use crate::types::{ConnId, Payload};

/// Registry + dispatcher pair, constructed once at server start.
pub struct Hub {
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
    next_id: AtomicU64,
    outbound_buffer: usize,
}

impl Hub {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            dispatcher: Dispatcher::new(),
            next_id: AtomicU64::new(1),
            outbound_buffer: config.outbound_buffer.max(1),
        }
    }

    /// Accept a connection backed by a bounded queue. The caller drains the
    /// receiver into the transport.
    pub fn accept(&self) -> Result<(Session, mpsc::Receiver<Payload>), HubError> {
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let session = self.accept_with(tx)?;
        Ok((session, rx))
    }

    /// Accept a connection with a caller-supplied outbound sink.
    pub fn accept_with(&self, outbound: impl Outbound + 'static) -> Result<Session, HubError> {
        let id = ConnId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let conn = Arc::new(Connection::new(id, outbound));
        if let Err(e) = self.registry.register(Arc::clone(&conn)) {
            error!(conn_id = %id, error = %e, "rejecting connection");
            return Err(e);
        }
        Ok(Session::new(conn, Arc::clone(&self.registry), self.dispatcher))
    }

    /// Broadcast on behalf of `source` without holding its session.
    pub fn broadcast(&self, source: ConnId, payload: &Payload) -> FanOut {
        self.dispatcher.on_message(&self.registry, source, payload)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}
