//! # Live Signal
//!
//! Signaling relay for peer-to-peer live audio/video sessions. A host
//! announces a live session, viewers discover and join it, and both sides
//! exchange offers, answers and ICE candidates through the relay. Media never
//! passes through the server and negotiation payloads are relayed untouched.
//!
//! ## Architecture
//!
//! - **domain**: `Identity` and `LiveSession` value types
//! - **application**: connection registry (identity groups, addressed
//!   delivery) and session router (session list, signaling protocol)
//! - **interfaces**: WebSocket transport and wire protocol, HTTP endpoints
//! - **shared**: error taxonomy and graceful shutdown
//! - **config** / **server**: TOML configuration and runtime bootstrap

pub mod application;
pub mod config;
pub mod domain;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{ConnectionRegistry, SessionRouter, SharedSessionRouter};
pub use domain::{Identity, LiveSession};
pub use interfaces::http::create_app_router;
pub use server::{init_tracing, ServerHandle};
