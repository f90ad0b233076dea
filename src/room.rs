//! RoomManager: one PeerManager and one ChatHub sharing a room identity.

use std::sync::Arc;

use crate::chat::ChatHub;
use crate::peer::PeerManager;

/// Everything scoped to a single room: its media-forwarding state and its
/// chat dispatcher. `Registry` owns these behind `Arc` so both the room-id
/// and derived stream-id lookup paths can share one instance.
pub struct RoomManager {
    pub peers: Arc<PeerManager>,
    pub chat: ChatHub,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            peers: Arc::new(PeerManager::new()),
            chat: ChatHub::spawn(),
        }
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_has_no_publishers() {
        let room = RoomManager::new();
        assert_eq!(room.peers.publisher_count(), 0);
    }
}
