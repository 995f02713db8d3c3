//! Domain types shared by the registry, the router and the transport.

pub mod identity;
pub mod live_session;

pub use identity::Identity;
pub use live_session::LiveSession;
