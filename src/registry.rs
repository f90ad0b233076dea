//! Registry: process-wide RoomId/StreamId -> RoomManager lookup (§4.8).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ids::{derive_stream_id, RoomId, StreamId};
use crate::room::RoomManager;

struct Inner {
    by_room: HashMap<RoomId, Arc<RoomManager>>,
    by_stream: HashMap<StreamId, Arc<RoomManager>>,
}

/// Holds every live room, indexed both by the client-supplied room id and by
/// the derived stream id a WHEP-style viewer connects with. A room is
/// created lazily on first publisher and never torn down on last-peer-leaves
/// (§9: no-teardown fidelity with the original), so a cold room id returns an
/// empty-but-live `RoomManager` rather than `NotFound`.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                by_room: HashMap::new(),
                by_stream: HashMap::new(),
            })),
        }
    }

    /// Look up a room by id, creating it (and its derived stream-id alias) if
    /// this is the first time it's been seen.
    pub fn get_or_create_room(&self, room_id: &RoomId) -> Arc<RoomManager> {
        if let Some(room) = self.inner.read().by_room.get(room_id) {
            return room.clone();
        }

        let mut inner = self.inner.write();
        // Re-check: another task may have created it between the read above
        // and acquiring the write lock.
        if let Some(room) = inner.by_room.get(room_id) {
            return room.clone();
        }

        let room = Arc::new(RoomManager::new());
        let stream_id = derive_stream_id(room_id);
        inner.by_room.insert(room_id.clone(), room.clone());
        inner.by_stream.insert(stream_id, room.clone());
        room
    }

    /// Look up a room by id without creating it.
    pub fn get_room(&self, room_id: &RoomId) -> Option<Arc<RoomManager>> {
        self.inner.read().by_room.get(room_id).cloned()
    }

    /// Look up a room by its derived stream id (the viewer/stream entry
    /// points never know the originating room id).
    pub fn get_by_stream(&self, stream_id: &StreamId) -> Option<Arc<RoomManager>> {
        self.inner.read().by_stream.get(stream_id).cloned()
    }

    /// All rooms currently registered, used by the process-wide keyframe
    /// ticker to fan out `dispatch_keyframe` without needing its own index.
    pub fn all_rooms(&self) -> Vec<Arc<RoomManager>> {
        self.inner.read().by_room.values().cloned().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_room_is_idempotent() {
        let registry = Registry::new();
        let room_id = RoomId::new("ROOM-1").unwrap();

        let first = registry.get_or_create_room(&room_id);
        let second = registry.get_or_create_room(&room_id);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn derived_stream_id_resolves_to_same_room() {
        let registry = Registry::new();
        let room_id = RoomId::new("ROOM-1").unwrap();
        let room = registry.get_or_create_room(&room_id);

        let stream_id = derive_stream_id(&room_id);
        let via_stream = registry.get_by_stream(&stream_id).expect("room exists");
        assert!(Arc::ptr_eq(&room, &via_stream));
    }

    #[test]
    fn unknown_room_returns_none() {
        let registry = Registry::new();
        let room_id = RoomId::new("NEVER-CREATED").unwrap();
        assert!(registry.get_room(&room_id).is_none());
    }

    #[test]
    fn all_rooms_reflects_every_created_room() {
        let registry = Registry::new();
        registry.get_or_create_room(&RoomId::new("A").unwrap());
        registry.get_or_create_room(&RoomId::new("B").unwrap());
        assert_eq!(registry.all_rooms().len(), 2);
    }
}
