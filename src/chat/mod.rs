//! Chat hub and per-client session loops.

pub mod client;
pub mod hub;

pub use client::run_chat_session;
pub use hub::ChatHub;
