//! Push-event channel: a minimal Socket.IO (Engine.IO v4) client over WebSocket.
//!
//! One background task reads frames, answers pings and publishes decoded
//! [`PushEvent`]s on a broadcast channel. Each view holds its own
//! [`Subscription`]; dropping it unsubscribes, dropping the [`PushChannel`]
//! stops the reader.

use std::collections::VecDeque;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::types::{Alert, MetricSample, TopologyGraph};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    NewAlert(Alert),
    MetricsUpdate(MetricSample),
    TopologyUpdate(TopologyGraph),
}

impl PushEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::NewAlert(_) => "new_alert",
            PushEvent::MetricsUpdate(_) => "metrics_update",
            PushEvent::TopologyUpdate(_) => "topology_update",
        }
    }
}

/// One decoded text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO handshake; the client must join the default namespace.
    Open,
    Ping,
    /// Socket.IO namespace join acknowledged.
    Connected,
    Disconnected,
    Event(PushEvent),
    /// Well-formed event we have no use for.
    Unhandled(String),
    Other,
}

/// Decodes a single Engine.IO text packet.
pub fn decode_frame(text: &str) -> Result<Frame, Error> {
    let mut chars = text.chars();
    let Some(eio) = chars.next() else {
        return Err(Error::Protocol("empty frame".into()));
    };
    let rest = chars.as_str();
    match eio {
        '0' => Ok(Frame::Open),
        '1' => Ok(Frame::Disconnected),
        '2' => Ok(Frame::Ping),
        '3' | '5' | '6' => Ok(Frame::Other),
        '4' => decode_socketio(rest),
        other => Err(Error::Protocol(format!("unknown engine.io packet type {other:?}"))),
    }
}

fn decode_socketio(packet: &str) -> Result<Frame, Error> {
    let mut chars = packet.chars();
    let Some(kind) = chars.next() else {
        return Err(Error::Protocol("empty socket.io packet".into()));
    };
    let mut body = chars.as_str();
    // Namespaced packets look like `/ns,<payload>`; only the default one is used.
    if body.starts_with('/') {
        body = body.split_once(',').map(|(_, b)| b).unwrap_or("");
    }
    match kind {
        '0' => Ok(Frame::Connected),
        '1' => Ok(Frame::Disconnected),
        '2' => {
            let payload = body.trim_start_matches(|c: char| c.is_ascii_digit());
            decode_event(payload)
        }
        '4' => Err(Error::Protocol(format!("connect error: {body}"))),
        _ => Ok(Frame::Other),
    }
}

fn decode_event(payload: &str) -> Result<Frame, Error> {
    let mut items: Vec<Value> =
        serde_json::from_str(payload).map_err(|e| Error::decode("push event", e))?;
    if items.is_empty() {
        return Err(Error::Protocol("event without a name".into()));
    }
    let data = if items.len() > 1 {
        items.swap_remove(1)
    } else {
        Value::Null
    };
    let Value::String(name) = items.swap_remove(0) else {
        return Err(Error::Protocol("event name is not a string".into()));
    };
    let ev = match name.as_str() {
        "new_alert" => PushEvent::NewAlert(
            serde_json::from_value(data).map_err(|e| Error::decode("new_alert", e))?,
        ),
        "metrics_update" => PushEvent::MetricsUpdate(
            serde_json::from_value(data).map_err(|e| Error::decode("metrics_update", e))?,
        ),
        "topology_update" => PushEvent::TopologyUpdate(
            serde_json::from_value(data).map_err(|e| Error::decode("topology_update", e))?,
        ),
        _ => return Ok(Frame::Unhandled(name)),
    };
    Ok(Frame::Event(ev))
}

/// Derives the Socket.IO WebSocket endpoint from the HTTP base URL.
pub fn push_url(base: &Url) -> Result<Url, Error> {
    let mut url = base.join("socket.io/")?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::Protocol(format!("cannot use {scheme} with {base}")))?;
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// Anything a view can drain push events from.
pub trait EventSource {
    fn try_next(&mut self) -> Option<PushEvent>;
}

pub struct Subscription {
    rx: broadcast::Receiver<PushEvent>,
}

impl Subscription {
    /// A subscription that never yields; used when the channel is unavailable.
    pub fn closed() -> Self {
        let (_tx, rx) = broadcast::channel(1);
        Self { rx }
    }
}

impl EventSource for Subscription {
    fn try_next(&mut self) -> Option<PushEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => return Some(ev),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "push subscriber fell behind");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

impl EventSource for VecDeque<PushEvent> {
    fn try_next(&mut self) -> Option<PushEvent> {
        self.pop_front()
    }
}

pub struct PushChannel {
    tx: broadcast::Sender<PushEvent>,
    task: JoinHandle<()>,
}

impl PushChannel {
    pub async fn connect(url: &Url) -> Result<Self, Error> {
        let (ws, _) = connect_async(url.as_str()).await?;
        info!(%url, "push channel connected");
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let task = tokio::spawn(read_loop(ws, tx.clone()));
        Ok(Self { tx, task })
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_loop(mut ws: WsStream, tx: broadcast::Sender<PushEvent>) {
    while let Some(msg) = ws.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "push channel read failed");
                break;
            }
        };
        match decode_frame(&text) {
            Ok(Frame::Open) => {
                if let Err(e) = ws.send(Message::Text("40".into())).await {
                    warn!(error = %e, "namespace join failed");
                    break;
                }
            }
            Ok(Frame::Ping) => {
                if let Err(e) = ws.send(Message::Text("3".into())).await {
                    warn!(error = %e, "pong failed");
                    break;
                }
            }
            Ok(Frame::Connected) => debug!("joined default namespace"),
            Ok(Frame::Disconnected) => break,
            Ok(Frame::Event(ev)) => {
                trace!(event = ev.name(), "push event");
                // No subscribers is not an error.
                let _ = tx.send(ev);
            }
            Ok(Frame::Unhandled(name)) => debug!(event = %name, "ignoring push event"),
            Ok(Frame::Other) => {}
            Err(e) => warn!(error = %e, "dropping push frame"),
        }
    }
    info!("push channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_and_ping_frames() {
        assert_eq!(
            decode_frame(r#"0{"sid":"abc","pingInterval":25000}"#).unwrap(),
            Frame::Open
        );
        assert_eq!(decode_frame("2").unwrap(), Frame::Ping);
        assert_eq!(decode_frame(r#"40{"sid":"x"}"#).unwrap(), Frame::Connected);
    }

    #[test]
    fn metrics_event_is_decoded() {
        let f = decode_frame(r#"42["metrics_update",{"cpu_percent":5.0,"memory_percent":9.5}]"#)
            .unwrap();
        match f {
            Frame::Event(PushEvent::MetricsUpdate(m)) => assert_eq!(m.memory_percent, 9.5),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[test]
    fn ack_id_and_unknown_event() {
        let f = decode_frame(r#"4217["connection_response",{"status":"connected"}]"#).unwrap();
        assert_eq!(f, Frame::Unhandled("connection_response".into()));
    }

    #[test]
    fn malformed_alert_payload_is_an_error() {
        let err = decode_frame(r#"42["new_alert",{"severity":9}]"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn controller_alert_shape_is_accepted() {
        let f = decode_frame(
            r#"42["new_alert",{"timestamp":"2024-05-01T10:00:00","severity":1,"source":"10.0.0.5","destination":"10.0.0.9","signature":"ET SCAN nmap"}]"#,
        )
        .unwrap();
        match f {
            Frame::Event(PushEvent::NewAlert(a)) => {
                assert_eq!(a.severity, crate::types::Severity::Critical);
                assert_eq!(a.source_ip, "10.0.0.5");
                assert_eq!(a.destination_ip, "10.0.0.9");
                assert_eq!(a.kind, "");
                assert_eq!(a.protocol, "");
                assert_eq!(a.signature, "ET SCAN nmap");
            }
            other => panic!("unexpected frame {other:?}"),
        }
        // Still strict about severity
        let bad = r#"42["new_alert",{"timestamp":"t","severity":7,"source":"a","destination":"b","signature":"s"}]"#;
        assert!(matches!(decode_frame(bad), Err(Error::Decode { .. })));
    }

    #[test]
    fn push_url_follows_base_scheme() {
        let base = Url::parse("https://ids.local:5000/").unwrap();
        let u = push_url(&base).unwrap();
        assert_eq!(
            u.as_str(),
            "wss://ids.local:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn closed_subscription_yields_nothing() {
        let mut s = Subscription::closed();
        assert!(s.try_next().is_none());
    }
}
