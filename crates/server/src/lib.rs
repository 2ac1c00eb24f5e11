use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use api_types::ErrorBody;
pub use auth::{AuthConfig, AuthManager, AuthUser, decode_secret_key};
pub use blob::{BlobStore, LocalBlobStore, StoredBlob};
pub use events::EventBus;
pub use mail::{SmtpConfig, SmtpMailer};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod auth;
mod bills;
mod blob;
mod events;
mod expenses;
mod goals;
mod mail;
mod server;
mod transactions;
mod users;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    Unauthorized(String),
    Internal(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Unauthorized(_) | EngineError::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        EngineError::InvalidId(_) => StatusCode::BAD_REQUEST,
        EngineError::Database(_) | EngineError::PasswordHash(_) | EngineError::Mail(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::InvalidAmount(_) | EngineError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(msg) => {
            tracing::error!("password hashing error: {msg}");
            "internal server error".to_string()
        }
        EngineError::Mail(msg) => {
            tracing::error!("mail error: {msg}");
            "Email not sent".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
