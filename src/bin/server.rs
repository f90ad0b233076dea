//! Thin demonstration binary: a TCP accept loop that extracts a room/stream
//! path from the websocket handshake and hands the connection to the
//! matching session loop in the library.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

use webrtc_sfu_core::chat::run_chat_session;
use webrtc_sfu_core::ids::{RoomId, StreamId};
use webrtc_sfu_core::peer::build_shared_api;
use webrtc_sfu_core::session::{run_publisher_session, run_stream_session, run_viewer_session};
use webrtc_sfu_core::{Config, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    RoomWebsocket,
    RoomChat,
    RoomViewer,
    StreamWebsocket,
    StreamChat,
    StreamViewer,
}

/// Parse a path like `/room/{id}/websocket` into its subject kind, id, and
/// route, matching the URL surface table in the core's external interface.
fn parse_path(path: &str) -> Option<(bool, String, Route)> {
    let mut parts = path.trim_start_matches('/').split('/');
    let kind = parts.next()?;
    let id = parts.next()?.to_owned();
    if id.is_empty() {
        return None;
    }
    let tail: Vec<&str> = parts.collect();

    let is_room = match kind {
        "room" => true,
        "stream" => false,
        _ => return None,
    };

    let route = match tail.as_slice() {
        ["websocket"] if is_room => Route::RoomWebsocket,
        ["websocket"] if !is_room => Route::StreamWebsocket,
        ["chat", "websocket"] if is_room => Route::RoomChat,
        ["chat", "websocket"] if !is_room => Route::StreamChat,
        ["viewer", "websocket"] if is_room => Route::RoomViewer,
        ["viewer", "websocket"] if !is_room => Route::StreamViewer,
        _ => return None,
    };

    Some((is_room, id, route))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let config = Config::from_env();
    let registry = Registry::new();
    let api = Arc::new(build_shared_api()?);
    let next_client_id = Arc::new(AtomicU64::new(1));

    webrtc_sfu_core::keyframe::spawn_keyframe_ticker(registry.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening on ws://{addr}");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let registry = registry.clone();
        let api = api.clone();
        let config = config.clone();
        let next_client_id = next_client_id.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, registry, api, config, next_client_id).await {
                log::warn!("connection from {peer_addr} ended with error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    registry: Registry,
    api: Arc<webrtc::api::API>,
    config: Config,
    next_client_id: Arc<AtomicU64>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut parsed: Option<(bool, String, Route)> = None;

    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |request: &Request, response: Response| {
            parsed = parse_path(request.uri().path());
            Ok(response)
        },
    )
    .await?;

    let Some((is_room, id, route)) = parsed else {
        log::debug!("rejecting connection from {peer_addr}: unrecognized path");
        return Ok(());
    };

    let room = if is_room {
        let Some(room_id) = RoomId::new(id) else {
            return Ok(());
        };
        registry.get_or_create_room(&room_id)
    } else {
        let stream_id = StreamId::from_raw(id);
        match registry.get_by_stream(&stream_id) {
            Some(room) => room,
            None => {
                log::debug!("stream {peer_addr} arrived before any publisher, closing");
                return Ok(());
            }
        }
    };

    match route {
        Route::RoomWebsocket => {
            run_publisher_session(ws_stream, &api, config.ice_configuration(), room.peers.clone()).await;
        }
        Route::StreamWebsocket => {
            run_stream_session(ws_stream, &api, config.ice_configuration(), room.peers.clone()).await;
        }
        Route::RoomChat | Route::StreamChat => {
            let client_id = next_client_id.fetch_add(1, Ordering::Relaxed);
            run_chat_session(ws_stream, room.chat.clone(), client_id).await;
        }
        Route::RoomViewer | Route::StreamViewer => {
            run_viewer_session(ws_stream, room.peers.clone()).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_room_websocket_path() {
        let (is_room, id, route) = parse_path("/room/ROOM-1/websocket").unwrap();
        assert!(is_room);
        assert_eq!(id, "ROOM-1");
        assert_eq!(route, Route::RoomWebsocket);
    }

    #[test]
    fn parses_stream_chat_path() {
        let (is_room, id, route) = parse_path("/stream/abc123/chat/websocket").unwrap();
        assert!(!is_room);
        assert_eq!(id, "abc123");
        assert_eq!(route, Route::StreamChat);
    }

    #[test]
    fn parses_viewer_paths_for_both_kinds() {
        assert_eq!(parse_path("/room/r/viewer/websocket").unwrap().2, Route::RoomViewer);
        assert_eq!(parse_path("/stream/s/viewer/websocket").unwrap().2, Route::StreamViewer);
    }

    #[test]
    fn rejects_unknown_or_incomplete_paths() {
        assert!(parse_path("/room/").is_none());
        assert!(parse_path("/room/r/unknown").is_none());
        assert!(parse_path("/other/r/websocket").is_none());
    }
}
