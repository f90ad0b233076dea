//! Publisher and stream-publisher session loops (§4.5, §4.6).

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use webrtc::api::API;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;

use serde::Deserialize;

use crate::peer::state::PeerConnectionState;
use crate::peer::PeerManager;
use crate::signaling::message::{EVENT_ANSWER, EVENT_CANDIDATE};
use crate::signaling::{SignalMessage, ThreadSafeSender};

/// The subset of a JSON session description the `custom-answer` envelope
/// carries; `sdp_type` is ignored since only answers are accepted here.
#[derive(Debug, Deserialize)]
struct SdpPayload {
    sdp: String,
}

/// Run a room publisher session: negotiates media and forwards inbound RTP
/// to the room's shared track map. Returns once the websocket ends.
pub async fn run_publisher_session(
    ws_stream: WebSocketStream<TcpStream>,
    api: &API,
    ice_config: RTCConfiguration,
    peers: Arc<PeerManager>,
) {
    run_session(ws_stream, api, ice_config, peers, true).await;
}

/// Run a stream publisher session: identical except inbound tracks of this
/// peer are not republished to the room's track map (§4.6) — it only
/// receives whatever the room's existing publishers have already added.
pub async fn run_stream_session(
    ws_stream: WebSocketStream<TcpStream>,
    api: &API,
    ice_config: RTCConfiguration,
    peers: Arc<PeerManager>,
) {
    run_session(ws_stream, api, ice_config, peers, false).await;
}

async fn run_session(
    ws_stream: WebSocketStream<TcpStream>,
    api: &API,
    ice_config: RTCConfiguration,
    peers: Arc<PeerManager>,
    handle_incoming_tracks: bool,
) {
    let (sink, mut stream) = ws_stream.split();
    let sender = Arc::new(ThreadSafeSender::new(sink));

    let peer_connection = match api.new_peer_connection(ice_config).await {
        Ok(pc) => Arc::new(pc),
        Err(e) => {
            log::warn!("failed to create peer connection: {e}");
            return;
        }
    };

    for kind in [RTPCodecType::Video, RTPCodecType::Audio] {
        if let Err(e) = peer_connection
            .add_transceiver_from_kind(
                kind,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
        {
            log::warn!("failed to set up {kind} transceiver: {e}");
            let _ = peer_connection.close().await;
            return;
        }
    }

    let id = peers.next_connection_id();
    let state = Arc::new(PeerConnectionState::new(id, peer_connection.clone(), sender.clone()));
    peers.append(state);

    install_ice_candidate_handler(&peer_connection, sender.clone());
    install_connection_state_handler(&peer_connection, peers.clone());

    if handle_incoming_tracks {
        install_track_handler(&peer_connection, peers.clone());
    }

    peers.signal_peer_connections().await;

    read_loop(&mut stream, &peer_connection).await;

    let _ = peer_connection.close().await;
    peers.remove_by_id(id);
    peers.signal_peer_connections().await;
}

fn install_ice_candidate_handler(
    peer_connection: &Arc<webrtc::peer_connection::RTCPeerConnection>,
    sender: Arc<ThreadSafeSender>,
) {
    peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        let sender = sender.clone();
        Box::pin(async move {
            let Some(candidate) = candidate else { return };
            let Ok(init) = candidate.to_json() else { return };
            let Ok(data) = serde_json::to_string(&init) else { return };
            let _ = sender.send_json(&SignalMessage::candidate(data)).await;
        })
    }));
}

fn install_connection_state_handler(
    peer_connection: &Arc<webrtc::peer_connection::RTCPeerConnection>,
    peers: Arc<PeerManager>,
) {
    let pc_for_failure = peer_connection.clone();
    peer_connection.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
        let peers = peers.clone();
        let pc_for_failure = pc_for_failure.clone();
        Box::pin(async move {
            match s {
                RTCPeerConnectionState::Failed => {
                    let _ = pc_for_failure.close().await;
                }
                RTCPeerConnectionState::Closed => {
                    peers.signal_peer_connections().await;
                }
                _ => {}
            }
        })
    }));
}

fn install_track_handler(
    peer_connection: &Arc<webrtc::peer_connection::RTCPeerConnection>,
    peers: Arc<PeerManager>,
) {
    peer_connection.on_track(Box::new(move |remote, _receiver, _transceiver| {
        let peers = peers.clone();
        Box::pin(async move {
            let local = match peers.add_track(&remote).await {
                Ok(local) => local,
                Err(e) => {
                    log::warn!("failed to add track {}: {e}", remote.id());
                    return;
                }
            };

            let track_id = remote.id();
            loop {
                match remote.read_rtp().await {
                    Ok((packet, _attrs)) => {
                        if let Err(e) = local.write_rtp(&packet).await {
                            log::debug!("forwarding write failed for {track_id}: {e}");
                            break;
                        }
                    }
                    Err(e) => {
                        log::debug!("remote read ended for {track_id}: {e}");
                        break;
                    }
                }
            }

            peers.remove_track(&track_id).await;
        })
    }));
}

async fn read_loop(
    stream: &mut futures_util::stream::SplitStream<WebSocketStream<TcpStream>>,
    peer_connection: &Arc<webrtc::peer_connection::RTCPeerConnection>,
) {
    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                log::debug!("publisher read error: {e}");
                break;
            }
        };

        let text = match frame {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        let msg: SignalMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                log::debug!("malformed signaling frame: {e}");
                continue;
            }
        };

        match msg.event.as_str() {
            EVENT_CANDIDATE => {
                if let Ok(init) = serde_json::from_str::<RTCIceCandidateInit>(&msg.data) {
                    if let Err(e) = peer_connection.add_ice_candidate(init).await {
                        log::debug!("add_ice_candidate failed: {e}");
                    }
                }
            }
            EVENT_ANSWER => {
                if let Ok(payload) = serde_json::from_str::<SdpPayload>(&msg.data) {
                    match RTCSessionDescription::answer(payload.sdp) {
                        Ok(desc) => {
                            if let Err(e) = peer_connection.set_remote_description(desc).await {
                                log::debug!("set_remote_description failed: {e}");
                            }
                        }
                        Err(e) => log::debug!("invalid answer sdp: {e}"),
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_event_name_matches_wire_contract() {
        assert_eq!(EVENT_CANDIDATE, "custom-candidate");
    }
}
