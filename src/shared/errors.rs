use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Rejection of a connection attempt before any message exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No caller ID found")]
    MissingIdentity,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Malformed inbound frame. Logged and dropped; the connection stays open.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Invalid payload for '{event}': {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing payload for '{0}'")]
    MissingPayload(String),

    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    #[error("Event '{0}' is reserved for the server")]
    ReservedEvent(String),

    #[error("Unsupported {0} frame")]
    UnsupportedFrame(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_maps_to_unauthorized() {
        let response = AuthError::MissingIdentity.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn protocol_error_messages() {
        assert_eq!(
            ProtocolError::UnknownEvent("dance".into()).to_string(),
            "Unknown event 'dance'"
        );
        assert_eq!(
            ProtocolError::UnsupportedFrame("binary").to_string(),
            "Unsupported binary frame"
        );
    }

    #[test]
    fn app_error_wraps_config_error() {
        let parse = toml::from_str::<toml::Value>("[server").unwrap_err();
        let err = AppError::from(ConfigError::from(parse));
        assert!(matches!(err, AppError::Config(ConfigError::Parse(_))));
        assert!(err.to_string().starts_with("Failed to parse config"));
    }
}
