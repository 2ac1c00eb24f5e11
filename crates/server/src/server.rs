use std::{path::PathBuf, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    AuthManager, BlobStore, EventBus, accounts, auth, bills, events, expenses, goals,
    transactions, users,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub auth: Arc<AuthManager>,
    pub events: EventBus,
    pub blobs: Arc<dyn BlobStore>,
    /// Directory served under `/uploads`.
    pub upload_dir: PathBuf,
    /// Base of emailed password reset links; the token is appended as a path segment.
    pub reset_url: String,
}

pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/reset", post(users::request_reset))
        .route("/api/users/reset/{token}", post(users::reset_password));

    let protected = Router::new()
        .route("/api/users/logout", get(users::logout))
        .route("/api/users/me", get(users::me))
        .route("/api/users/update", put(users::update_profile))
        .route("/api/users/change-password", put(users::change_password))
        .route("/api/accounts", get(accounts::list).post(accounts::create))
        .route("/api/accounts/reconcile", post(accounts::reconcile))
        .route(
            "/api/accounts/{id}",
            get(accounts::detail)
                .put(accounts::update)
                .delete(accounts::remove),
        )
        .route(
            "/api/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/api/transactions/summary", get(transactions::summary))
        .route(
            "/api/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::remove),
        )
        .route("/api/bills", get(bills::list).post(bills::create))
        .route(
            "/api/bills/{id}",
            get(bills::get).put(bills::update).delete(bills::remove),
        )
        .route("/api/goals", get(goals::list).post(goals::create))
        .route(
            "/api/goals/{id}",
            get(goals::get).put(goals::update).delete(goals::remove),
        )
        .route("/api/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/api/expenses/analytics/comparison",
            get(expenses::comparison),
        )
        .route("/api/expenses/analytics/breakdown", get(expenses::breakdown))
        .route(
            "/api/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::remove),
        )
        .route("/api/notifications/stream", get(events::stream))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(state: ServerState, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
