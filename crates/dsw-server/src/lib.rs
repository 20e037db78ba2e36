pub mod error;
pub mod executor;
pub mod routes;
pub mod state;

use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use dsw_core::Action;
use std::collections::BTreeMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

pub use executor::{Executor, ExecutorConfig};

pub const DEFAULT_PORT: u16 = 8080;
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Listener and lifecycle settings for one server instance.
///
/// The default binds every interface. There is no authentication, so anyone
/// who can reach the port can trigger any registered action.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
    pub executor: ExecutorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            shutdown_grace: SHUTDOWN_GRACE,
            executor: ExecutorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Request ids for the `x-request-id` header.
#[derive(Clone, Copy, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(actions: BTreeMap<String, Action>, executor: Executor) -> Router {
    let app_state = state::AppState::new(actions, executor);

    Router::new()
        .route("/actions", get(routes::actions::list_actions))
        .route("/execute/{name}", post(routes::actions::execute_action))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(app_state)
}

// ---------------------------------------------------------------------------
// Serving
// ---------------------------------------------------------------------------

/// Bind `config.socket_addr()` and serve `actions` until SIGINT/SIGTERM.
pub async fn serve(actions: BTreeMap<String, Action>, config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.socket_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, actions = actions.len(), "starting server");

    let app = build_router(actions, Executor::new(config.executor));
    serve_on(listener, app, shutdown_signal(), config.shutdown_grace).await
}

/// Serve `app` on a pre-bound listener until `shutdown` resolves.
///
/// Once `shutdown` fires the listener stops accepting and in-flight requests
/// get `grace` to finish. After that this returns regardless; the caller is
/// expected to exit.
pub async fn serve_on<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown.await;
        tracing::info!("shutting down server");
        let _ = signalled_tx.send(());
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        res = &mut server => return Ok(res??),
        _ = signalled_rx => {}
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(res) => res??,
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish in time, exiting anyway"
            );
            server.abort();
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
