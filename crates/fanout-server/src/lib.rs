pub mod envelope;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use fanout_core::config::Config;
use fanout_core::pool::ExecutionPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/time", get(routes::time::get_time))
        .route("/api/fan-out", get(routes::fan_out::fan_out))
        .route("/api/pool", get(routes::pool::get_pool))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve on a pre-bound listener until Ctrl-C.
///
/// The caller binds the `TcpListener` so it can read the actual port before
/// starting (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(config: Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = state::AppState::new(config)?;
    let pool = app_state.orchestrator.pool().clone();
    let app = build_router(app_state);

    tracing::info!("fanout server listening on http://localhost:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pool))
        .await?;

    tracing::info!("fanout server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, interrupting any units still sleeping so in-flight
/// requests drain with error records instead of holding shutdown open.
async fn shutdown_signal(pool: ExecutionPool) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    pool.shutdown_now();
}
