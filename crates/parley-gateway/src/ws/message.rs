use parley_hub::{FanOut, Session};
use parley_protocol::frames;
use tracing::warn;

/// Process one inbound WS text frame.
///
/// A `message` event is broadcast to every connection, this one included.
/// Anything else is logged and dropped; the connection stays open.
pub fn handle(session: &Session, text: &str) -> Option<FanOut> {
    match frames::decode_message(text) {
        Ok(payload) => Some(session.on_message(payload)),
        Err(e) => {
            warn!(conn_id = %session.id(), error = %e, "ignoring inbound frame");
            None
        }
    }
}
