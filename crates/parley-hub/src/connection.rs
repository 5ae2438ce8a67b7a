use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::DeliveryError;
use crate::types::{ConnId, Payload};

/// Connection lifecycle — linear progression, no backwards transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnState {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl ConnState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnState::Open,
            1 => ConnState::Closing,
            _ => ConnState::Closed,
        }
    }
}

/// Where a connection's outbound messages go.
///
/// Delivery must never wait: the hub calls this once per recipient inside a
/// fan-out pass, and a slow client must not hold up the others.
pub trait Outbound: Send + Sync {
    fn try_deliver(&self, payload: Payload) -> Result<(), DeliveryError>;
}

impl Outbound for mpsc::Sender<Payload> {
    fn try_deliver(&self, payload: Payload) -> Result<(), DeliveryError> {
        self.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// One accepted client session as the hub sees it.
pub struct Connection {
    id: ConnId,
    state: AtomicU8,
    outbound: Box<dyn Outbound>,
}

impl Connection {
    pub fn new(id: ConnId, outbound: impl Outbound + 'static) -> Self {
        Self {
            id,
            state: AtomicU8::new(ConnState::Open as u8),
            outbound: Box::new(outbound),
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn state(&self) -> ConnState {
        ConnState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnState::Open
    }

    /// Queue a payload for this connection. Refused once the connection has
    /// started closing.
    pub fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        if !self.is_open() {
            return Err(DeliveryError::NotOpen);
        }
        self.outbound.try_deliver(payload.clone())
    }

    /// Open -> Closing. Returns false if another caller got there first.
    pub(crate) fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(
                ConnState::Open as u8,
                ConnState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn mark_closed(&self) {
        self.state.store(ConnState::Closed as u8, Ordering::Release);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
