//! Publisher/stream/viewer websocket session loops (§4.5–§4.7).

pub mod publisher;
pub mod viewer;

pub use publisher::{run_publisher_session, run_stream_session};
pub use viewer::run_viewer_session;
