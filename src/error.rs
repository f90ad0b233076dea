//! Crate-wide error type.

use thiserror::Error;

/// Error kinds produced by the core peer-manager/chat-hub subsystem.
///
/// Propagation policy (see module docs for detail): identifier/parse errors
/// close the originating websocket; `SendClosed`/`ReadClosed` are terminal
/// for the owning session only; `PeerCreationFailed`/`TransceiverSetupFailed`
/// end the session before it is appended to any manager; `OversizeMessage`
/// closes a chat client. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum SfuError {
    #[error("no room or stream with id {0:?}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("failed to create peer connection: {0}")]
    PeerCreationFailed(String),

    #[error("failed to set up transceivers: {0}")]
    TransceiverSetupFailed(String),

    #[error("failed to parse signaling message: {0}")]
    SignalingParseError(#[from] serde_json::Error),

    #[error("send side of connection is closed")]
    SendClosed,

    #[error("read side of connection is closed")]
    ReadClosed,

    #[error("message exceeds the maximum allowed size")]
    OversizeMessage,

    #[error(transparent)]
    Webrtc(#[from] webrtc::Error),
}

pub type Result<T> = std::result::Result<T, SfuError>;
