//! Viewer session: periodic peer-count ticker (§4.7).

use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::peer::PeerManager;

const VIEWER_TICK: Duration = Duration::from_secs(1);

/// Write the current publisher count as a decimal-ASCII text frame every
/// second until the write fails, then close.
pub async fn run_viewer_session(ws_stream: WebSocketStream<TcpStream>, peers: Arc<PeerManager>) {
    let mut ws_stream = ws_stream;
    let mut ticker = tokio::time::interval(VIEWER_TICK);

    loop {
        ticker.tick().await;
        let count = peers.publisher_count();
        if ws_stream.send(Message::Text(count.to_string())).await.is_err() {
            break;
        }
    }

    let _ = ws_stream.close(None).await;
}

#[cfg(test)]
mod tests {
    #[test]
    fn tick_interval_is_one_second() {
        assert_eq!(super::VIEWER_TICK.as_secs(), 1);
    }
}
