use crate::errors::KeyGenError;
use crate::generator::KeyGenerator;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub type AppState = Arc<KeyGenerator>;

/// Builds the HTTP surface over a shared generator.
///
/// Unsupported methods on a known path get 405 from the method router. HEAD is
/// answered explicitly since `get` would otherwise accept it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/key", post(generate_key))
        .route(
            "/keys/",
            get(empty_key_status)
                .post(submit_empty_key)
                .head(method_not_allowed),
        )
        // Everything after `/keys/` is the key, slashes included.
        .route(
            "/keys/*value",
            get(key_status).post(submit_key).head(method_not_allowed),
        )
        .route("/count", get(free_count).head(method_not_allowed))
        .route("/healthcheck", any(health_check))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

impl IntoResponse for KeyGenError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            debug!(error = %self, "rejected request");
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, self.to_string()).into_response()
    }
}

// Near exhaustion allocation can sweep the keyspace, so it runs off the async workers.
async fn generate_key(State(state): State<AppState>) -> Response {
    match tokio::task::spawn_blocking(move || state.generate()).await {
        Ok(Ok(value)) => (StatusCode::CREATED, value).into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "key generation failed");
            e.into_response()
        }
        Err(e) => {
            error!(error = %e, "key generation task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn key_status(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<String, KeyGenError> {
    Ok(state.status(&value)?.to_string())
}

async fn submit_key(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<StatusCode, KeyGenError> {
    state.submit(&value)?;
    Ok(StatusCode::OK)
}

// `/keys/` with nothing after it is a zero-length key.
async fn empty_key_status(State(state): State<AppState>) -> Result<String, KeyGenError> {
    Ok(state.status("")?.to_string())
}

async fn submit_empty_key(State(state): State<AppState>) -> Result<StatusCode, KeyGenError> {
    state.submit("")?;
    Ok(StatusCode::OK)
}

async fn free_count(State(state): State<AppState>) -> String {
    state.free_count().to_string()
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

async fn health_check() -> &'static str {
    "OK"
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    info!(%method, %uri, status = response.status().as_u16(), "request");
    response
}
