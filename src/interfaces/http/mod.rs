//! HTTP interfaces
//!
//! - `handlers`: info, inspection, health and metrics endpoints
//! - `middleware`: request id propagation and HTTP request metrics
//! - `router`: application router (HTTP + signaling socket) with OpenAPI document

pub mod handlers;
pub mod middleware;
pub mod router;

pub use router::{create_app_router, AppState};
