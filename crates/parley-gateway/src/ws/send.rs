use axum::extract::ws::{Message, WebSocket};
use futures_util::SinkExt;
use parley_hub::Payload;
use parley_protocol::frames::EventFrame;

pub type WsSink = futures_util::stream::SplitSink<WebSocket, Message>;

/// Wrap a broadcast payload in a `message` event and send it.
pub async fn message(tx: &mut WsSink, payload: &Payload) -> Result<(), axum::Error> {
    let json = EventFrame::message(payload.as_str()).to_json();
    tx.send(Message::Text(json.into())).await
}
