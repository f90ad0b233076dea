//! Serializes signaling writes on a single websocket.

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Result, SfuError};
use crate::signaling::message::SignalMessage;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Wraps a websocket's write half with a mutex so concurrent callers never
/// interleave frames on the same connection. The lock is held across the
/// `.send().await`, which is why it is a `tokio::sync::Mutex` rather than
/// `parking_lot` (the one place in the crate an async-aware lock is needed).
pub struct ThreadSafeSender {
    sink: Mutex<WsSink>,
}

impl ThreadSafeSender {
    pub fn new(sink: WsSink) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Serialize `value` to a single text frame and write it atomically.
    pub async fn send_json(&self, value: &SignalMessage) -> Result<()> {
        let text = serde_json::to_string(value)?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text))
            .await
            .map_err(|_| SfuError::SendClosed)
    }

    /// Write a raw text frame, used by chat/viewer sessions whose payload
    /// isn't a `SignalMessage` envelope.
    pub async fn send_text(&self, text: String) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text))
            .await
            .map_err(|_| SfuError::SendClosed)
    }

    pub async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let _ = sink.close().await;
    }
}

#[cfg(test)]
mod tests {
    // ThreadSafeSender needs a live websocket connection to exercise
    // send_json against; round-trip framing is covered by
    // signaling::message::tests and end to end in session tests.
}
