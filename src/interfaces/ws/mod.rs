//! WebSocket interfaces
//!
//! - `protocol`: JSON frame format for requests and server events
//! - `signaling`: per-socket transport loop bridging axum sockets to the router

pub mod protocol;
pub mod signaling;

pub use protocol::{ClientRequest, ServerEvent};
pub use signaling::{ws_signaling_handler, SignalingState};
