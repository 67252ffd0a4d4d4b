//! Plain HTTP liveness endpoint for hosting platforms that probe a port.

use crate::config::LivenessConfig;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Body returned by every liveness route.
pub const LIVENESS_BODY: &str = "Lunch bot is running\n";

pub fn router() -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/health", get(alive))
}

async fn alive() -> &'static str {
    LIVENESS_BODY
}

/// Bind to the configured address and serve until `cancel` fires.
pub async fn run_liveness(
    config: &LivenessConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, cancel).await
}

/// Serve the liveness routes on an already bound listener.
pub async fn serve(listener: TcpListener, cancel: CancellationToken) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("liveness endpoint listening on http://{local_addr}");
    axum::serve(listener, router())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}
