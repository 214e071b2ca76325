//! # Web crate: the Atlantis serverless handlers as an HTTP service
//!
//! Hosts `/signup` and `/protected-api/{endpoint}` on axum, using the
//! service-role backend credentials from [`Settings`]. The same routes are also
//! served under `/.netlify/functions/` so existing page scripts keep working.

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod error;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::ApiError;
pub use settings::Settings;
pub use state::AppState;

use routes::{protected_handler, signup_handler};

pub fn router(state: AppState) -> Router {
    let functions = Router::new()
        .route("/signup", any(signup_handler))
        .route("/protected-api", any(protected_handler))
        .route("/protected-api/{*endpoint}", any(protected_handler));

    let router = Router::new()
        .merge(functions.clone())
        .nest("/.netlify/functions", functions)
        .with_state(state);
    catch_panics(router)
}

/// A handler that panics answers 500 `Internal server error` instead of
/// dropping the connection.
fn catch_panics(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);
    ApiError::Internal.into_response()
}

pub async fn start_server() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::error!("Failed to load settings, using defaults: {}", e);
        Settings::default()
    });
    let state = AppState::from_settings(&settings);

    let address = settings.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
