use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The one event name used in both directions.
pub const MESSAGE_EVENT: &str = "message";

const EVENT_TYPE: &str = "event";

/// Server ↔ Client chat event.
/// Wire: `{ "type": "event", "event": "message", "payload": "hi" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub event: String,
    pub payload: String,
}

impl EventFrame {
    pub fn message(payload: impl Into<String>) -> Self {
        Self {
            frame_type: EVENT_TYPE.to_string(),
            event: MESSAGE_EVENT.to_string(),
            payload: payload.into(),
        }
    }

    /// Serialize to the JSON text sent in a WS text frame.
    pub fn to_json(&self) -> String {
        // three string fields, cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unexpected frame type: {0}")]
    UnexpectedType(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("message payload must be a string")]
    NonTextPayload,
}

/// Raw inbound frame — check the `type` discriminator and event name before
/// trusting the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Extract the text payload of a `message` event.
    pub fn into_message(self) -> Result<String, FrameError> {
        if self.frame_type != EVENT_TYPE {
            return Err(FrameError::UnexpectedType(self.frame_type));
        }
        match self.event.as_deref() {
            Some(MESSAGE_EVENT) => {}
            other => return Err(FrameError::UnknownEvent(other.unwrap_or_default().to_string())),
        }
        match self.payload {
            Value::String(s) => Ok(s),
            _ => Err(FrameError::NonTextPayload),
        }
    }
}

/// Parse a WS text frame into the message payload it carries.
pub fn decode_message(text: &str) -> Result<String, FrameError> {
    InboundFrame::parse(text)?.into_message()
}
