use thiserror::Error;

use crate::types::ConnId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    /// Two live connections with one identity. Indicates a bug in the accept path.
    #[error("Connection {0} is already registered")]
    DuplicateIdentity(ConnId),
}

/// Why a single recipient missed a broadcast. Never escapes a fan-out pass.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving side of the outbound queue is gone.
    #[error("outbound channel closed")]
    Closed,

    /// The recipient is not draining its queue fast enough.
    #[error("outbound queue full")]
    Full,

    /// The connection is closing or closed.
    #[error("connection not open")]
    NotOpen,
}
