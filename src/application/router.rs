//! Session router: live-session bookkeeping and the signaling protocol
//!
//! Owns the process-wide list of live sessions. Every list mutation, every
//! snapshot and every announcement of a list change happens under the same
//! lock, so all connections observe list changes in one order.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::application::session::{Connection, ConnectionId, SharedConnectionRegistry};
use crate::domain::{Identity, LiveSession};
use crate::interfaces::ws::protocol::{ClientRequest, ServerEvent};
use crate::shared::errors::ProtocolError;

pub struct SessionRouter {
    sessions: Mutex<Vec<LiveSession>>,
    registry: SharedConnectionRegistry,
}

pub type SharedSessionRouter = Arc<SessionRouter>;

impl SessionRouter {
    pub fn new(registry: SharedConnectionRegistry) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            registry,
        }
    }

    pub fn shared(registry: SharedConnectionRegistry) -> SharedSessionRouter {
        Arc::new(Self::new(registry))
    }

    pub fn registry(&self) -> &SharedConnectionRegistry {
        &self.registry
    }

    /// Bind an authenticated socket to `identity`.
    ///
    /// The registry snapshot is queued before the connection joins its group,
    /// so it is the first frame the client sees.
    pub async fn connect(
        &self,
        identity: Identity,
        sender: mpsc::UnboundedSender<String>,
    ) -> ConnectionId {
        let sessions = self.sessions.lock().await;

        let connection_id = self.registry.next_connection_id();
        let connection = Connection::new(connection_id, identity.clone(), sender);

        let snapshot = ServerEvent::LiveSessions {
            live_sessions: sessions.clone(),
        };
        match snapshot.to_frame() {
            Ok(frame) => {
                if let Err(e) = connection.send(frame) {
                    warn!(
                        %identity,
                        %connection_id,
                        error = %e,
                        "Failed to queue session snapshot"
                    );
                }
            }
            Err(e) => warn!(%identity, error = %e, "Failed to encode session snapshot"),
        }

        self.registry.enroll(connection);
        metrics::counter!("signaling_connections_total").increment(1);
        info!(%identity, %connection_id, live_sessions = sessions.len(), "User connected");

        connection_id
    }

    /// Decode and dispatch one inbound text frame.
    ///
    /// A malformed frame is returned as an error without touching any state.
    pub async fn handle_frame(
        &self,
        identity: &Identity,
        frame: &str,
    ) -> Result<(), ProtocolError> {
        let request = ClientRequest::parse(frame)?;
        self.handle(identity, request).await;
        Ok(())
    }

    /// Record a rejected frame. The connection stays open.
    pub fn report_protocol_error(&self, identity: &Identity, error: &ProtocolError) {
        metrics::counter!("signaling_protocol_errors_total").increment(1);
        warn!(%identity, error = %error, "Dropping message");
    }

    pub async fn handle(&self, identity: &Identity, request: ClientRequest) {
        metrics::counter!("signaling_messages_total", "event" => request.event_name())
            .increment(1);

        match request {
            ClientRequest::StartLive { session_name } => {
                self.start_live(identity, session_name).await;
            }
            ClientRequest::JoinLive { host_id } => {
                info!(viewer = %identity, host = %host_id, "Joining live session");
                self.registry.deliver_to(
                    &host_id,
                    &ServerEvent::IncomingViewer {
                        viewer_id: identity.clone(),
                    },
                );
            }
            ClientRequest::Offer { to, offer } => {
                info!(from = %identity, %to, "Relaying offer");
                self.registry.deliver_to(
                    &to,
                    &ServerEvent::Offer {
                        from: identity.clone(),
                        offer,
                    },
                );
            }
            ClientRequest::Answer { to, answer } => {
                info!(from = %identity, %to, "Relaying answer");
                self.registry.deliver_to(
                    &to,
                    &ServerEvent::Answer {
                        from: identity.clone(),
                        answer,
                    },
                );
            }
            ClientRequest::IceCandidate { to, candidate } => {
                info!(from = %identity, %to, "Relaying ICE candidate");
                self.registry.deliver_to(
                    &to,
                    &ServerEvent::IceCandidate {
                        from: identity.clone(),
                        candidate,
                    },
                );
            }
        }
    }

    async fn start_live(&self, identity: &Identity, session_name: String) {
        let mut sessions = self.sessions.lock().await;

        let session = LiveSession::new(identity.clone(), session_name);
        info!(host = %identity, session_name = %session.session_name, "Live session started");
        sessions.push(session.clone());
        metrics::gauge!("signaling_live_sessions").set(sessions.len() as f64);

        self.registry.broadcast(&ServerEvent::NewLiveSession(session));
    }

    /// Tear down a closed socket.
    ///
    /// Every session hosted by `identity` is removed and a single
    /// `live-session-ended` is broadcast, even when nothing was hosted.
    pub async fn disconnect(&self, identity: &Identity, connection_id: ConnectionId) {
        let mut sessions = self.sessions.lock().await;

        self.registry.unenroll(identity, connection_id);

        let before = sessions.len();
        sessions.retain(|s| &s.host_id != identity);
        let ended = before - sessions.len();
        metrics::gauge!("signaling_live_sessions").set(sessions.len() as f64);

        info!(%identity, %connection_id, ended_sessions = ended, "User disconnected");

        self.registry.broadcast(&ServerEvent::LiveSessionEnded {
            host_id: identity.clone(),
        });
    }

    /// Current session list in announcement order
    pub async fn live_sessions(&self) -> Vec<LiveSession> {
        self.sessions.lock().await.clone()
    }
}
