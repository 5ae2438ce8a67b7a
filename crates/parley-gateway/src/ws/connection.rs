use axum::{
    body::Bytes,
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use parley_hub::{CloseReason, Payload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::ws::{message, send};

/// Axum handler — upgrades HTTP to WebSocket at GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection event loop — lives for the entire WS session.
///
/// One task per socket: it reads inbound frames into the hub and drains this
/// connection's outbound queue into the socket, so a slow client only ever
/// stalls itself. Every write is bounded by one heartbeat period.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let (session, mut outbound) = match state.hub.accept() {
        Ok(accepted) => accepted,
        Err(e) => {
            error!(error = %e, "failed to register WS connection");
            return;
        }
    };
    let conn_id = session.id();
    info!(
        conn_id = %conn_id,
        clients = state.hub.connection_count(),
        "new WS connection"
    );

    let (mut tx, mut rx) = socket.split();
    let max_payload = state.config.hub.max_payload_bytes;
    let period = Duration::from_secs(state.config.gateway.heartbeat_interval_secs.max(1));

    let mut shutdown = state.shutdown_signal();
    if *shutdown.borrow_and_update() {
        close_with(&mut tx, close_code::AWAY, "server shutdown", period).await;
        session.close(CloseReason::Shutdown);
        return;
    }

    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_seen = Instant::now();

    let reason = loop {
        tokio::select! {
            msg = rx.next() => {
                if let Some(Ok(_)) = &msg {
                    last_seen = Instant::now();
                }
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > max_payload {
                            warn!(conn_id = %conn_id, size = text.len(), max = max_payload, "payload too large");
                            close_with(&mut tx, close_code::SIZE, "payload too large", period).await;
                            break CloseReason::PayloadTooLarge;
                        }
                        message::handle(&session, text.as_str());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if !send_within(&mut tx, Message::Pong(data), period).await {
                            break CloseReason::SendFailed;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break CloseReason::ClientClosed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break CloseReason::TransportError(e.to_string()),
                    None => break CloseReason::StreamEnded,
                }
            }

            queued = outbound.recv() => {
                let Some(payload) = queued else {
                    break CloseReason::StreamEnded;
                };
                if !deliver_within(&mut tx, &payload, period).await {
                    break CloseReason::SendFailed;
                }
            }

            _ = heartbeat.tick() => {
                if heartbeat_expired(last_seen.elapsed(), period) {
                    warn!(conn_id = %conn_id, quiet_secs = last_seen.elapsed().as_secs(), "peer stopped answering pings");
                    close_with(&mut tx, close_code::AWAY, "heartbeat timeout", period).await;
                    break CloseReason::HeartbeatTimeout;
                }
                if !send_within(&mut tx, Message::Ping(Bytes::new()), period).await {
                    break CloseReason::SendFailed;
                }
            }

            _ = shutdown.changed() => {
                flush(&mut tx, &mut outbound, period).await;
                close_with(&mut tx, close_code::AWAY, "server shutdown", period).await;
                break CloseReason::Shutdown;
            }
        }
    };

    session.close(reason);
}

/// Two heartbeat periods without any inbound frame, pongs included.
fn heartbeat_expired(quiet: Duration, period: Duration) -> bool {
    quiet > period * 2
}

async fn send_within(tx: &mut send::WsSink, msg: Message, limit: Duration) -> bool {
    matches!(timeout(limit, tx.send(msg)).await, Ok(Ok(())))
}

async fn deliver_within(tx: &mut send::WsSink, payload: &Payload, limit: Duration) -> bool {
    matches!(timeout(limit, send::message(tx, payload)).await, Ok(Ok(())))
}

async fn close_with(tx: &mut send::WsSink, code: u16, reason: &'static str, limit: Duration) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    send_within(tx, Message::Close(Some(frame)), limit).await;
}

/// Write out whatever is already queued before a graceful close.
async fn flush(tx: &mut send::WsSink, outbound: &mut mpsc::Receiver<Payload>, limit: Duration) {
    while let Ok(payload) = outbound.try_recv() {
        if !deliver_within(tx, &payload, limit).await {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_router;
    use parley_core::config::ParleyConfig;
    use parley_hub::ConnId;
    use parley_protocol::frames::{decode_message, EventFrame};
    use std::net::SocketAddr;
    use tokio_tungstenite::tungstenite::{self, protocol::frame::coding::CloseCode};
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    const WAIT: Duration = Duration::from_secs(5);

    async fn serve(config: ParleyConfig) -> (Arc<AppState>, SocketAddr) {
        let state = Arc::new(AppState::new(config));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (state, addr)
    }

    async fn wait_for_count(state: &AppState, expected: usize, within: Duration) {
        let deadline = Instant::now() + within;
        while state.hub.connection_count() != expected && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.hub.connection_count(), expected);
    }

    async fn connect(state: &AppState, addr: SocketAddr) -> Client {
        let expected = state.hub.connection_count() + 1;
        let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        wait_for_count(state, expected, WAIT).await;
        ws
    }

    async fn send_text(ws: &mut Client, text: &str) {
        let frame = EventFrame::message(text).to_json();
        ws.send(tungstenite::Message::text(frame)).await.unwrap();
    }

    /// Next chat payload, skipping control frames.
    async fn recv_text(ws: &mut Client) -> String {
        loop {
            let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
            match msg {
                tungstenite::Message::Text(t) => return decode_message(t.as_str()).unwrap(),
                tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => {}
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    /// Chat payloads received before the close frame, and the close code.
    async fn recv_until_close(ws: &mut Client) -> (Vec<String>, Option<CloseCode>) {
        let mut texts = Vec::new();
        loop {
            let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
            match msg {
                tungstenite::Message::Text(t) => texts.push(decode_message(t.as_str()).unwrap()),
                tungstenite::Message::Close(frame) => return (texts, frame.map(|f| f.code)),
                _ => {}
            }
        }
    }

    #[test]
    fn heartbeat_expiry_threshold() {
        let period = Duration::from_secs(1);
        assert!(!heartbeat_expired(Duration::from_millis(1500), period));
        assert!(!heartbeat_expired(Duration::from_secs(2), period));
        assert!(heartbeat_expired(Duration::from_millis(2001), period));
    }

    #[tokio::test]
    async fn join_send_leave_send_over_sockets() {
        let (state, addr) = serve(ParleyConfig::default()).await;
        let mut a = connect(&state, addr).await;
        let mut b = connect(&state, addr).await;

        send_text(&mut a, "hi").await;
        assert_eq!(recv_text(&mut a).await, "hi");
        assert_eq!(recv_text(&mut b).await, "hi");

        drop(b);
        wait_for_count(&state, 1, WAIT).await;

        send_text(&mut a, "bye").await;
        assert_eq!(recv_text(&mut a).await, "bye");
    }

    #[tokio::test]
    async fn client_close_unregisters() {
        let (state, addr) = serve(ParleyConfig::default()).await;
        let mut a = connect(&state, addr).await;

        a.close(None).await.unwrap();
        wait_for_count(&state, 0, WAIT).await;
    }

    #[tokio::test]
    async fn oversized_frame_closes_with_size_code() {
        let mut config = ParleyConfig::default();
        config.hub.max_payload_bytes = 64;
        let (state, addr) = serve(config).await;
        let mut a = connect(&state, addr).await;

        send_text(&mut a, &"x".repeat(200)).await;
        let (texts, code) = recv_until_close(&mut a).await;
        assert!(texts.is_empty());
        assert_eq!(code, Some(CloseCode::Size));
        wait_for_count(&state, 0, WAIT).await;
    }

    #[tokio::test]
    async fn shutdown_flushes_queue_then_closes() {
        let (state, addr) = serve(ParleyConfig::default()).await;
        let mut a = connect(&state, addr).await;

        state.hub.broadcast(ConnId(0), &Payload::from("last words"));
        state.begin_shutdown();

        let (texts, code) = recv_until_close(&mut a).await;
        assert_eq!(texts, vec!["last words"]);
        assert_eq!(code, Some(CloseCode::Away));
        wait_for_count(&state, 0, WAIT).await;
    }

    #[tokio::test]
    async fn silent_peer_dropped_after_missed_heartbeats() {
        let mut config = ParleyConfig::default();
        config.gateway.heartbeat_interval_secs = 1;
        let (state, addr) = serve(config).await;

        // never polled again, so pings go unanswered
        let _silent = connect(&state, addr).await;
        wait_for_count(&state, 0, Duration::from_secs(6)).await;
    }

    #[tokio::test]
    async fn answering_peer_survives_heartbeats() {
        let mut config = ParleyConfig::default();
        config.gateway.heartbeat_interval_secs = 1;
        let (state, addr) = serve(config).await;
        let mut a = connect(&state, addr).await;

        // reading lets the client answer pings with pongs
        let quiet = tokio::time::sleep(Duration::from_secs(4));
        tokio::pin!(quiet);
        loop {
            tokio::select! {
                _ = &mut quiet => break,
                msg = a.next() => assert!(matches!(msg, Some(Ok(tungstenite::Message::Ping(_))))),
            }
        }
        assert_eq!(state.hub.connection_count(), 1);
    }
}
