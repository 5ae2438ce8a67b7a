//! Connection registry and broadcast fan-out for the chat server.
//!
//! The gateway owns one [`Hub`]; every accepted WebSocket gets a [`Session`]
//! that registers on creation, dispatches inbound messages to all live
//! connections, and unregisters exactly once when closed.

pub mod connection;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod registry;
pub mod session;
pub mod types;

pub use connection::{ConnState, Connection, Outbound};
pub use dispatch::{Dispatcher, FanOut};
pub use error::{DeliveryError, HubError};
pub use hub::Hub;
pub use registry::Registry;
pub use session::{CloseReason, Session};
pub use types::{ConnId, Payload};
