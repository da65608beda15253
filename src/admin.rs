//! Operator endpoints and the static file hit counter.
//!
//! - GET `/metrics` - HTML page with the number of `/app/` requests served
//! - POST `/reset` - Zero the counter and delete every user (dev platform only)

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};

use crate::api::{ApiError, ResultExt};
use crate::cli::Platform;
use crate::db::Database;

/// Requests served from the static file root since start or last reset.
#[derive(Clone, Default)]
pub struct HitCounter(Arc<AtomicU64>);

impl HitCounter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// Middleware counting every request that reaches the file server.
pub async fn count_hits(State(hits): State<HitCounter>, request: Request, next: Next) -> Response {
    hits.increment();
    next.run(request).await
}

#[derive(Clone)]
pub struct AdminState {
    pub db: Database,
    pub hits: HitCounter,
    pub platform: Platform,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/reset", post(reset))
        .with_state(state)
}

async fn metrics(State(state): State<AdminState>) -> impl IntoResponse {
    Html(format!(
        "<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>",
        state.hits.get()
    ))
}

async fn reset(State(state): State<AdminState>) -> Result<Response, ApiError> {
    if state.platform != Platform::Dev {
        return Err(ApiError::forbidden("Reset is only allowed in dev"));
    }

    state.hits.reset();
    let deleted = state
        .db
        .users()
        .delete_all()
        .await
        .db_err("Failed to delete users")?;

    tracing::warn!(users = deleted, "Server state reset");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Hits reset to 0 and all users deleted.",
    )
        .into_response())
}
