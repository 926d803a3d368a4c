//! Viewer HTTP + WebSocket server (single port).

use crate::bridge::JPEG_DATA_URI_PREFIX;
use crate::config::ViewerConfig;
use crate::display::{DisplaySurface, ImageElement};
use crate::viewer::page::render_page;
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::Engine;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Shared state for the viewer routes.
#[derive(Clone)]
struct ViewerState {
    element: Arc<ImageElement>,
    /// Set to true when the server starts shutting down; open sockets close on it.
    closing: Arc<watch::Sender<bool>>,
}

/// Bind the configured address. Done before anything else starts so a taken port fails fast.
pub async fn bind_viewer(config: &ViewerConfig) -> Result<TcpListener> {
    let bind_addr = format!("{}:{}", config.bind.trim(), config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding viewer to {}", bind_addr))?;
    log::info!("viewer listening on http://{}", bind_addr);
    Ok(listener)
}

/// Serve the viewer on an already bound listener.
pub async fn serve_viewer<F>(
    listener: TcpListener,
    element: Arc<ImageElement>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::debug!("serving element #{}", element.id());
    let closing = Arc::new(watch::channel(false).0);
    let state = ViewerState {
        element,
        closing: closing.clone(),
    };
    let app = Router::new()
        .route("/", get(page_http))
        .route("/health", get(health_http))
        .route("/frame.jpg", get(frame_http))
        .route("/ws", get(ws_handler))
        .with_state(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            log::info!("viewer shutting down, closing frame streams");
            closing.send_replace(true);
        })
        .await
        .context("viewer server exited")?;
    log::info!("viewer stopped");
    Ok(())
}

/// Future that completes on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// GET / serves the page holding the image element.
async fn page_http(State(state): State<ViewerState>) -> Html<String> {
    Html(render_page(state.element.id()))
}

/// GET /health returns element id and frame count as JSON.
async fn health_http(State(state): State<ViewerState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "element": state.element.id(),
        "frames": state.element.write_count(),
    }))
}

/// GET /frame.jpg returns the latest frame's bytes.
async fn frame_http(State(state): State<ViewerState>) -> Response {
    let Some(src) = state.element.image_src() else {
        return (StatusCode::NOT_FOUND, "no frame received yet").into_response();
    };
    let payload = src.strip_prefix(JPEG_DATA_URI_PREFIX).unwrap_or(src.as_str());
    match base64::engine::general_purpose::STANDARD.decode(payload.as_bytes()) {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("latest frame is not valid base64: {}", e),
        )
            .into_response(),
    }
}

/// GET /ws streams image sources: the current one (if any), then every update.
async fn ws_handler(State(state): State<ViewerState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Completes once shutdown has started, including when it started before the call.
async fn closed(closing: &mut watch::Receiver<bool>) {
    if closing.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn handle_socket(mut socket: WebSocket, state: ViewerState) {
    let mut closing = state.closing.subscribe();
    let mut src_rx = state.element.subscribe();

    let current = src_rx.borrow_and_update().clone();
    if let Some(src) = current {
        if socket.send(Message::Text(src)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            biased;

            _ = closed(&mut closing) => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            changed = src_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = src_rx.borrow_and_update().clone();
                let Some(src) = next else { continue };
                if socket.send(Message::Text(src)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    log::debug!("viewer socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscriber_sees_shutdown() {
        let (closing, _) = watch::channel(false);
        closing.send_replace(true);
        let mut rx = closing.subscribe();
        tokio::time::timeout(Duration::from_millis(200), closed(&mut rx))
            .await
            .expect("shutdown already started");
    }

    #[tokio::test]
    async fn closed_waits_while_running() {
        let (closing, _) = watch::channel(false);
        let mut rx = closing.subscribe();
        let waited = tokio::time::timeout(Duration::from_millis(50), closed(&mut rx)).await;
        assert!(waited.is_err());
        closing.send_replace(true);
        tokio::time::timeout(Duration::from_millis(200), closed(&mut rx))
            .await
            .expect("shutdown started");
    }
}
