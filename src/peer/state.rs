//! PeerConnectionState: one PeerConnection paired with its signaling sender.

use std::sync::Arc;

use webrtc::peer_connection::RTCPeerConnection;

use crate::signaling::ThreadSafeSender;

/// Owns one PeerConnection and one ThreadSafeSender bound to the client's
/// signaling websocket. Equality is by identity (`id`), assigned once at
/// construction, not by structural comparison of the contained members.
pub struct PeerConnectionState {
    pub id: u64,
    pub peer_connection: Arc<RTCPeerConnection>,
    pub sender: Arc<ThreadSafeSender>,
}

impl PeerConnectionState {
    pub fn new(id: u64, peer_connection: Arc<RTCPeerConnection>, sender: Arc<ThreadSafeSender>) -> Self {
        Self {
            id,
            peer_connection,
            sender,
        }
    }
}

impl PartialEq for PeerConnectionState {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PeerConnectionState {}
