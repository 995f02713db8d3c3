pub mod health;
pub mod info;
pub mod live_sessions;
pub mod metrics;
