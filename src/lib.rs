//! Signaling and media-forwarding core of a lightweight WebRTC SFU.
//!
//! Rooms and streams are backed by one [`registry::Registry`], each room
//! pairing a [`peer::PeerManager`] (track map, renegotiation, keyframe
//! dispatch) with a [`chat::ChatHub`] (broadcast bus). Publisher, stream,
//! and viewer websockets are driven by the loops in [`session`]; chat
//! websockets by [`chat::run_chat_session`].

pub mod chat;
pub mod config;
pub mod error;
pub mod ids;
pub mod keyframe;
pub mod peer;
pub mod registry;
pub mod room;
pub mod session;
pub mod signaling;

pub use config::Config;
pub use error::{Result, SfuError};
pub use ids::{derive_stream_id, RoomId, StreamId};
pub use registry::Registry;
pub use room::RoomManager;
