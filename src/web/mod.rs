//! HTTP surface: routing, per-request storage handles and the server loop.

pub mod error;
pub mod routes;
pub mod session;
pub mod views;

use crate::app::CardService;
use crate::backends::SqliteBackend;
use crate::setup::arguments::Config;
use error::AppError;

use axum::{
    Router,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use log::{info, warn};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::catch_panic::CatchPanicLayer;

/// Shared, read-only state handed to every request
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// Each request gets a fresh backend; its connection opens on first query and
// closes when the handler returns and the service is dropped
impl FromRequestParts<AppState> for CardService {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::new(Box::new(SqliteBackend::new(&state.config.database))))
    }
}

/// Runs storage work on tokio's blocking pool.
///
/// The service moves into the task, so its connection is opened and closed on
/// the blocking thread. The outer result only fails if the task itself died;
/// the inner one is whatever the storage call returned.
///
/// # Errors
///
/// Returns [`AppError::Blocking`] if the task panicked or was cancelled.
pub async fn blocking<T, F>(service: CardService, work: F) -> Result<crate::Result<T>, AppError>
where
    T: Send + 'static,
    F: FnOnce(&CardService) -> crate::Result<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || work(&service)).await?)
}

/// Builds the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/cards", get(routes::cards))
        .route("/filter_cards/{name}", get(routes::filter_cards))
        .route("/add", post(routes::add_card))
        .route("/edit/{id}", get(routes::edit))
        .route("/edit_card", post(routes::edit_card))
        .route("/delete/{id}", get(routes::delete))
        .route("/general", get(routes::general).post(routes::general))
        .route(
            "/general/{id}",
            get(routes::general_card).post(routes::general_card),
        )
        .route("/code", get(routes::code).post(routes::code))
        .route("/code/{id}", get(routes::code_card).post(routes::code_card))
        .route("/mark_known/{id}/{route}", get(routes::mark_known))
        .route("/login", get(routes::login_form).post(routes::login))
        .route("/logout", get(routes::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_layer,
        ))
        .layer(middleware::from_fn(log_request))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{method} {path} -> {} ({:.1?})",
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

/// Binds to the configured address and serves until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the database can't be opened or the address can't be bound.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    // Fail fast on a bad database path instead of on the first request
    SqliteBackend::new(&config.database).ensure_schema()?;
    info!("Using database at '{}'", config.database);

    let address = config.address();
    let app = router(AppState::new(config));

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
