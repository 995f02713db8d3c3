//! Reusable signaling server runtime.
//!
//! [`ServerHandle`] encapsulates the server lifecycle: registry and router
//! wiring, the axum listener, and graceful shutdown.

use std::net::SocketAddr;

use tracing::{error, info};

use crate::application::{ConnectionRegistry, SessionRouter, SharedSessionRouter};
use crate::config::AppConfig;
use crate::interfaces::http::{create_app_router, AppState};
use crate::shared::errors::AppError;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Handle to a running signaling server.
///
/// # Examples
///
/// ```rust,no_run
/// use live_signal::config::AppConfig;
/// use live_signal::server::ServerHandle;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(AppConfig::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Session router shared by every socket and the HTTP handlers.
    pub router: SharedSessionRouter,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the listener is bound to (resolves port 0).
    pub local_addr: SocketAddr,

    shutdown: ShutdownCoordinator,
    http_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Bind the listener and start serving.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        info!("Starting signaling server...");

        let registry = ConnectionRegistry::shared();
        let router = SessionRouter::shared(registry);

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let app = create_app_router(AppState::new(router.clone(), shutdown_signal.clone()));

        let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening on http://{}", local_addr);
        info!("Signaling socket at ws://{}/socket?callerId={{id}}", local_addr);

        let http_shutdown = shutdown_signal.clone();
        let http_task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                http_shutdown.wait().await;
                info!("HTTP server received shutdown signal");
            });

            if let Err(e) = server.await {
                error!("HTTP server error: {}", e);
            }
        });

        Ok(Self {
            router,
            config,
            local_addr,
            shutdown,
            http_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for shutdown to be triggered, then for the server to stop,
    /// bounded by the configured shutdown timeout.
    pub async fn wait(self) {
        let Self {
            router,
            shutdown,
            http_task,
            ..
        } = self;

        let abort = http_task.abort_handle();
        let finished = shutdown
            .shutdown_with_cleanup(|| async move {
                match http_task.await {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => error!("HTTP server task failed: {}", e),
                }
            })
            .await;

        if !finished {
            abort.abort();
        }

        info!(
            remaining_connections = router.registry().connection_count(),
            "Signaling server shutdown complete"
        );
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down signaling server...");
        self.trigger_shutdown();
        self.wait().await;
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
