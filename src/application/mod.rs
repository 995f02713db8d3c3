pub mod router;
pub mod session;

// Re-export key types for convenience
pub use router::{SessionRouter, SharedSessionRouter};
pub use session::{Connection, ConnectionId, ConnectionRegistry, SharedConnectionRegistry};
