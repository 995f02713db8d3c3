pub mod connection;
pub mod registry;

pub use connection::{Connection, ConnectionId};
pub use registry::{ConnectionRegistry, SharedConnectionRegistry, IDENTITY_KEY};
