use tracing::debug;

use crate::registry::Registry;
use crate::types::{ConnId, Payload};

/// Outcome of one fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    pub recipients: usize,
    pub delivered: usize,
    pub dropped: usize,
}

/// Fans one inbound message out to every registered connection, sender
/// included. Holds no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher;

impl Dispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Deliver `payload` to every connection in a fresh registry snapshot.
    ///
    /// A failed delivery only costs that recipient this message; the rest of
    /// the pass continues and nothing is returned to the source.
    pub fn on_message(&self, registry: &Registry, source: ConnId, payload: &Payload) -> FanOut {
        let recipients = registry.snapshot();
        let mut report = FanOut {
            recipients: recipients.len(),
            ..FanOut::default()
        };

        for conn in &recipients {
            match conn.deliver(payload) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.dropped += 1;
                    debug!(
                        conn_id = %conn.id(),
                        source = %source,
                        error = %e,
                        "delivery dropped"
                    );
                }
            }
        }

        debug!(
            source = %source,
            bytes = payload.len(),
            recipients = report.recipients,
            delivered = report.delivered,
            dropped = report.dropped,
            "broadcast message"
        );
        report
    }
}
