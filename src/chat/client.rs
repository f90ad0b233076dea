//! ChatClient session: the reader/writer cooperative halves of one chat websocket.

use std::time::{Duration, Instant};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::chat::hub::{new_client_handle, ChatHub};

const PONG_INTERVAL: Duration = Duration::from_secs(40);
const PING_INTERVAL: Duration = Duration::from_millis(36_000); // 9/10 of PONG_INTERVAL
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_MESSAGE_SIZE: usize = 512;

/// Replace newlines with spaces and trim outer whitespace (§4.2).
fn normalize(frame: &str) -> String {
    frame.replace('\n', " ").trim().to_string()
}

/// Run a chat websocket end to end: register with `hub`, drive the reader
/// loop on the current task, and run the writer loop on a spawned task.
/// Returns once the connection is done; cleanup (unregister, abort the
/// writer task) is deferred via the returned guard's drop.
pub async fn run_chat_session(ws_stream: WebSocketStream<TcpStream>, hub: ChatHub, client_id: u64) {
    let (sink, stream) = ws_stream.split();
    let (handle, rx) = new_client_handle(client_id);
    hub.register(handle).await;

    let writer_task = tokio::spawn(write_loop(sink, rx));

    read_loop(stream, &hub, client_id).await;

    hub.unregister(client_id).await;
    writer_task.abort();
}

async fn read_loop(mut stream: SplitStream<WebSocketStream<TcpStream>>, hub: &ChatHub, client_id: u64) {
    let mut deadline = Instant::now() + PONG_INTERVAL;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let next = tokio::time::timeout(remaining, stream.next()).await;

        let msg = match next {
            Err(_) => {
                log::debug!("chat client {client_id} idle timeout");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                log::debug!("chat client {client_id} read error: {e}");
                break;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        match msg {
            Message::Pong(_) => {
                deadline = Instant::now() + PONG_INTERVAL;
            }
            Message::Text(text) => {
                if text.len() > MAX_MESSAGE_SIZE {
                    log::debug!("chat client {client_id} sent oversize frame, closing");
                    break;
                }
                hub.broadcast(normalize(&text)).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

async fn write_loop(mut sink: SplitSink<WebSocketStream<TcpStream>, Message>, mut rx: mpsc::Receiver<String>) {
    let mut ping_ticker = tokio::time::interval(PING_INTERVAL);
    ping_ticker.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(first) = maybe else { break };
                let mut frame = first;

                // Opportunistically coalesce any additional already-queued
                // messages into one frame, separated by newlines.
                while let Ok(more) = rx.try_recv() {
                    frame.push('\n');
                    frame.push_str(&more);
                }

                let send = sink.send(Message::Text(frame));
                if tokio::time::timeout(WRITE_TIMEOUT, send).await.is_err() {
                    break;
                }
            }
            _ = ping_ticker.tick() => {
                let send = sink.send(Message::Ping(Vec::new()));
                if tokio::time::timeout(WRITE_TIMEOUT, send).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_replaces_newlines_and_trims() {
        assert_eq!(normalize("  hello\nworld  "), "hello world");
        assert_eq!(normalize("\n\nleading"), "leading");
    }

    #[test]
    fn boundary_message_sizes() {
        let ok = "a".repeat(512);
        let oversize = "a".repeat(513);
        assert!(ok.len() <= MAX_MESSAGE_SIZE);
        assert!(oversize.len() > MAX_MESSAGE_SIZE);
    }
}
