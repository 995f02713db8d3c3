//! Signaling wire protocol
//!
//! Every WebSocket text frame carries one JSON object:
//!
//! ```json
//! {"event": "offer", "data": {"to": "bob", "offer": {"type": "offer", "sdp": "..."}}}
//! ```
//!
//! Negotiation payloads (`offer`, `answer`, `candidate`) are kept as raw JSON
//! and relayed without being re-encoded.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::domain::{Identity, LiveSession};
use crate::shared::errors::ProtocolError;

/// Inbound event names
pub mod events {
    pub const START_LIVE: &str = "start-live";
    pub const JOIN_LIVE: &str = "join-live";
    pub const OFFER: &str = "offer";
    pub const ANSWER: &str = "answer";
    pub const ICE_CANDIDATE: &str = "ice-candidate";
    /// Raised by the transport when a socket closes; clients may not send it.
    pub const DISCONNECT: &str = "disconnect";
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartLivePayload {
    session_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinLivePayload {
    host_id: Identity,
}

#[derive(Debug, Deserialize)]
struct OfferPayload {
    to: Identity,
    offer: Box<RawValue>,
}

#[derive(Debug, Deserialize)]
struct AnswerPayload {
    to: Identity,
    answer: Box<RawValue>,
}

#[derive(Debug, Deserialize)]
struct CandidatePayload {
    to: Identity,
    candidate: Box<RawValue>,
}

/// A request sent by a client over its signaling socket.
#[derive(Debug)]
pub enum ClientRequest {
    StartLive { session_name: String },
    JoinLive { host_id: Identity },
    Offer { to: Identity, offer: Box<RawValue> },
    Answer { to: Identity, answer: Box<RawValue> },
    IceCandidate { to: Identity, candidate: Box<RawValue> },
}

impl ClientRequest {
    /// Decode one text frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(frame).map_err(ProtocolError::Malformed)?;
        let event = envelope.event;

        match event.as_str() {
            events::START_LIVE => {
                let p: StartLivePayload = decode_payload(&event, envelope.data.as_deref())?;
                Ok(Self::StartLive {
                    session_name: p.session_name,
                })
            }
            events::JOIN_LIVE => {
                let p: JoinLivePayload = decode_payload(&event, envelope.data.as_deref())?;
                Ok(Self::JoinLive { host_id: p.host_id })
            }
            events::OFFER => {
                let p: OfferPayload = decode_payload(&event, envelope.data.as_deref())?;
                Ok(Self::Offer {
                    to: p.to,
                    offer: p.offer,
                })
            }
            events::ANSWER => {
                let p: AnswerPayload = decode_payload(&event, envelope.data.as_deref())?;
                Ok(Self::Answer {
                    to: p.to,
                    answer: p.answer,
                })
            }
            events::ICE_CANDIDATE => {
                let p: CandidatePayload = decode_payload(&event, envelope.data.as_deref())?;
                Ok(Self::IceCandidate {
                    to: p.to,
                    candidate: p.candidate,
                })
            }
            events::DISCONNECT => Err(ProtocolError::ReservedEvent(event)),
            _ => Err(ProtocolError::UnknownEvent(event)),
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::StartLive { .. } => events::START_LIVE,
            Self::JoinLive { .. } => events::JOIN_LIVE,
            Self::Offer { .. } => events::OFFER,
            Self::Answer { .. } => events::ANSWER,
            Self::IceCandidate { .. } => events::ICE_CANDIDATE,
        }
    }
}

fn decode_payload<'de, T: Deserialize<'de>>(
    event: &str,
    data: Option<&'de RawValue>,
) -> Result<T, ProtocolError> {
    let raw = data.ok_or_else(|| ProtocolError::MissingPayload(event.to_string()))?;
    serde_json::from_str(raw.get()).map_err(|source| ProtocolError::InvalidPayload {
        event: event.to_string(),
        source,
    })
}

/// An event pushed by the server to one or more connections.
#[derive(Debug, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Full registry snapshot, sent once right after authentication
    LiveSessions { live_sessions: Vec<LiveSession> },
    NewLiveSession(LiveSession),
    LiveSessionEnded { host_id: Identity },
    IncomingViewer { viewer_id: Identity },
    Offer { from: Identity, offer: Box<RawValue> },
    Answer { from: Identity, answer: Box<RawValue> },
    IceCandidate { from: Identity, candidate: Box<RawValue> },
}

impl ServerEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::LiveSessions { .. } => "live-sessions",
            Self::NewLiveSession(_) => "new-live-session",
            Self::LiveSessionEnded { .. } => "live-session-ended",
            Self::IncomingViewer { .. } => "incoming-viewer",
            Self::Offer { .. } => events::OFFER,
            Self::Answer { .. } => events::ANSWER,
            Self::IceCandidate { .. } => events::ICE_CANDIDATE,
        }
    }

    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
