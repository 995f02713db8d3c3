//! Participant identity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::errors::AuthError;

/// Opaque participant token supplied by the client at connect time.
///
/// Never verified against an external authority; the only rule is that it
/// must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Build an identity from a caller-supplied token.
    ///
    /// The token is bound exactly as sent; only an absent or empty token is
    /// rejected.
    pub fn parse(token: Option<&str>) -> Result<Self, AuthError> {
        match token {
            Some(t) if !t.is_empty() => Ok(Self(t.to_string())),
            _ => Err(AuthError::MissingIdentity),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}
