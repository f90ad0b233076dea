//! The flat signaling envelope shared by every room/stream websocket.

use serde::{Deserialize, Serialize};

/// `{ "event": ..., "data": ... }`, the wire format for all signaling traffic.
///
/// `data` carries a second, independently-serialized JSON payload (an ICE
/// candidate or a session description) as a string rather than a nested
/// object, matching the original handler's envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    pub event: String,
    pub data: String,
}

impl SignalMessage {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    pub fn candidate(data: impl Into<String>) -> Self {
        Self::new(EVENT_CANDIDATE, data)
    }

    pub fn keyframe() -> Self {
        Self::new(EVENT_KEYFRAME, "")
    }

    pub fn answer(data: impl Into<String>) -> Self {
        Self::new(EVENT_ANSWER, data)
    }

    pub fn offer(data: impl Into<String>) -> Self {
        Self::new(EVENT_OFFER, data)
    }
}

pub const EVENT_CANDIDATE: &str = "custom-candidate";
pub const EVENT_KEYFRAME: &str = "custom-keyframe";
pub const EVENT_ANSWER: &str = "custom-answer";
pub const EVENT_OFFER: &str = "custom-offer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let msg = SignalMessage::candidate(r#"{"candidate":"a=candidate:1"}"#);
        let json = serde_json::to_string(&msg).unwrap();
        let back: SignalMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event, EVENT_CANDIDATE);
        assert_eq!(back.data, msg.data);
    }

    #[test]
    fn keyframe_payload_is_empty_string() {
        let msg = SignalMessage::keyframe();
        assert_eq!(msg.event, EVENT_KEYFRAME);
        assert_eq!(msg.data, "");
    }
}
