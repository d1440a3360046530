use crate::error::{Result, UserdeskError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::debug;

pub const CALLBACK_PATH: &str = "/callback";

const SIGNED_IN_PAGE: &str =
    "<html><body><h2>Sign-in complete</h2><p>You can close this window and return to the terminal.</p></body></html>";

/// Query parameters the provider appends to the redirect.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

type Reply = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

/// Serve the loopback redirect until a request for the callback path arrives.
///
/// Other paths (browsers like to ask for `/favicon.ico`) get a 404. The
/// server shuts down gracefully once the first callback is in, or when this
/// future is dropped.
pub async fn wait_for_callback(listener: TcpListener) -> Result<CallbackParams> {
    let (params_tx, params_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let reply: Reply = Arc::new(Mutex::new(Some(params_tx)));
    let app = Router::new()
        .route(CALLBACK_PATH, get(receive))
        .fallback(not_found)
        .with_state(reply);

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // Fires on send and when the sender is dropped.
                let _ = stop_rx.await;
            })
            .await
    });

    let params = params_rx.await;
    let _ = stop_tx.send(());

    match params {
        Ok(params) => Ok(params),
        Err(_) => {
            let reason = match server.await {
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
                Ok(Ok(())) => "stopped".to_string(),
            };
            Err(UserdeskError::Auth(format!(
                "Redirect listener failed: {}",
                reason
            )))
        }
    }
}

async fn receive(
    State(reply): State<Reply>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    debug!(
        has_code = params.code.is_some(),
        error = ?params.error,
        "redirect received"
    );
    let sender = reply
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    if let Some(sender) = sender {
        let _ = sender.send(params);
    }
    Html(SIGNED_IN_PAGE)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
