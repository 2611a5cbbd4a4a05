//! HTTP surface for hosting platforms.
//!
//! `GET /` answers a fixed liveness string and `GET /qr` serves the last
//! pairing code as an SVG image, so the QR can be scanned from a browser
//! when the terminal is not reachable.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::bot::BotError;
use crate::context::AppContext;
use crate::session::qr;

pub const LIVENESS_TEXT: &str = "🤖 Bot WhatsApp da Aetronics está activo e rodando.";

/// Build the HTTP router.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(liveness_handler))
        .route("/qr", get(qr_handler))
        .with_state(ctx)
}

async fn liveness_handler() -> &'static str {
    LIVENESS_TEXT
}

async fn qr_handler(State(ctx): State<Arc<AppContext>>) -> Response {
    let Some(code) = ctx.last_qr() else {
        return (StatusCode::NOT_FOUND, "No QR code available").into_response();
    };
    match qr::render_svg(&code) {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => {
            warn!("Failed to render QR code for HTTP: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render QR code").into_response()
        }
    }
}

/// Serve the health endpoints on all interfaces until `shutdown` resolves.
pub async fn serve(
    ctx: Arc<AppContext>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), BotError> {
    let port = ctx.config.port;
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("🌐 Health server listening on port {}", port);
    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// GET `url` once, returning the HTTP status.
pub async fn ping(url: &str) -> Result<u16, String> {
    let url = url.to_string();
    let result = tokio::task::spawn_blocking(move || {
        ureq::get(&url)
            .timeout(Duration::from_secs(10))
            .call()
            .map(|resp| resp.status())
    })
    .await
    .map_err(|e| e.to_string())?;

    match result {
        Ok(status) => Ok(status),
        Err(ureq::Error::Status(status, _)) => Ok(status),
        Err(e) => Err(e.to_string()),
    }
}

/// Ping `url` every `interval` so the hosting platform sees traffic.
pub fn spawn_keepalive(url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match ping(&url).await {
                Ok(status) if (200..400).contains(&status) => {
                    debug!("Keep-alive ping to {} returned {}", url, status)
                }
                Ok(status) => warn!("Keep-alive ping to {} returned {}", url, status),
                Err(e) => warn!("Keep-alive ping to {} failed: {}", url, e),
            }
        }
    })
}
