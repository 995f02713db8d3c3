//! Announced live session record

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Identity;

/// A live session announced by its host.
///
/// Exists only while the host's connection is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    /// Identity of the hosting participant
    #[schema(value_type = String)]
    pub host_id: Identity,
    /// Display name chosen by the host
    pub session_name: String,
}

impl LiveSession {
    pub fn new(host_id: Identity, session_name: impl Into<String>) -> Self {
        Self {
            host_id,
            session_name: session_name.into(),
        }
    }
}
