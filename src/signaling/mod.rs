//! Signaling envelope and the per-connection serialized sender.

pub mod message;
pub mod sender;

pub use message::SignalMessage;
pub use sender::ThreadSafeSender;
