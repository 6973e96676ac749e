//! HTTP boundary.
//!
//! Thin axum layer over the session manager and transaction
//! coordinator: routes build a write plan, run it in one transaction,
//! and map the outcome to a status code. The coordinator's error kinds
//! are distinguishable here without parsing message strings.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rand::Rng;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::core::{TxnError, WriteOutcome, WriteRecord};
use crate::session::SessionManager;
use crate::store::{MemoryStore, TransactionOptions};
use crate::transaction::TransactionPlan;

/// Collection the demo routes write into.
pub const EPISODES: &str = "episodes";

/// Shared per-process state for the HTTP boundary.
pub struct AppState {
    pub manager: SessionManager<MemoryStore>,
    /// Stamped into record titles. Explicit configuration, not read
    /// from ambient process state inside transaction logic.
    pub hostname: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/error", get(always_error))
        .route("/db", get(two_inserts))
        .route("/db2", get(insert_then_report_failure))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Serialize)]
struct PingResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct InsertedResponse {
    inserted: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

async fn index() -> Html<&'static str> {
    Html("Hello, Docker! <3")
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "OK" })
}

async fn always_error() -> WebError {
    WebError::Internal("nothing error".to_string())
}

/// Two inserts in one transaction; both commit or neither does.
async fn two_inserts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsertedResponse>, WebError> {
    let duration = rand::thread_rng().gen_range(0..5);

    let plan = TransactionPlan::new()
        .insert(
            EPISODES,
            WriteRecord::new("A Transaction Episode for the Ages", 15),
        )
        .insert(
            EPISODES,
            WriteRecord::new(format!("Transactions for All {}", state.hostname), duration),
        );

    let outcomes = state.manager.run(TransactionOptions::new(), plan).await?;
    Ok(Json(inserted(outcomes)))
}

/// One insert, a successful commit, then a deliberate downstream
/// failure. The commit stands and no abort is attempted; the failure
/// surfaces as its own error kind.
async fn insert_then_report_failure(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InsertedResponse>, WebError> {
    let plan = TransactionPlan::new()
        .insert(
            EPISODES,
            WriteRecord::new("A Transaction Episode for the Ages", 15),
        )
        .post_commit(|| Err("wanted error for failing transaction".to_string()));

    let outcomes = state.manager.run(TransactionOptions::new(), plan).await?;
    Ok(Json(inserted(outcomes)))
}

fn inserted(outcomes: Vec<WriteOutcome>) -> InsertedResponse {
    InsertedResponse {
        inserted: outcomes.iter().map(|o| o.id.to_string()).collect(),
    }
}

#[derive(Debug)]
pub enum WebError {
    Txn(TxnError),
    Internal(String),
}

impl From<TxnError> for WebError {
    fn from(err: TxnError) -> Self {
        WebError::Txn(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Txn(TxnError::Connection(msg)) => {
                (StatusCode::BAD_GATEWAY, msg, "store_unreachable".to_string())
            }
            WebError::Txn(TxnError::TransactionBegin(msg)) => {
                (StatusCode::CONFLICT, msg, "transaction_begin".to_string())
            }
            WebError::Txn(TxnError::Operation(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                msg,
                "write_failed".to_string(),
            ),
            WebError::Txn(TxnError::Commit(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "commit_failed".to_string(),
            ),
            WebError::Txn(TxnError::Abort { reason, original }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("abort failed: {}; original error: {}", reason, original),
                "abort_failed".to_string(),
            ),
            WebError::Txn(TxnError::InvalidAbortAfterCommit) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "abort attempted after successful commit".to_string(),
                "invalid_abort_after_commit".to_string(),
            ),
            WebError::Txn(TxnError::CommittedButReported(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "committed_but_reported".to_string(),
            ),
            WebError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "internal_error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
        });

        (status, body).into_response()
    }
}
