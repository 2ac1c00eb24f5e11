//! User registration, login and profile endpoints.

use api_types::{
    MessageResponse,
    user::{
        LoginResponse, PasswordChange, PasswordReset, PasswordResetRequest, UserLogin,
        UserRegister, UserView,
    },
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use engine::{AvatarRef, NewUser, ProfilePatch, User};

use crate::{AuthUser, ServerError, server::ServerState};

pub(crate) fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        avatar_url: user.avatar_url,
        created_at: user.created_at,
    }
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .register(NewUser::new(
            payload.email,
            payload.password,
            payload.full_name,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?;
    let access_token = state.auth.issue_token(user.id)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.expires_in().as_secs(),
        user: user_view(user),
    }))
}

/// Tokens are stateless; the client simply drops its token.
pub async fn logout(Extension(user): Extension<AuthUser>) -> Json<MessageResponse> {
    tracing::info!(user_id = %user.id, "user logged out");
    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

pub async fn me(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(user.id).await?;
    Ok(Json(user_view(user)))
}

/// Multipart profile update with optional `full_name` text and `avatar` file
/// fields.
pub async fn update_profile(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Json<UserView>, ServerError> {
    let mut patch = ProfilePatch::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Generic(e.body_text()))?
    {
        match field.name() {
            Some("full_name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::Generic(e.body_text()))?;
                patch.full_name = Some(text);
            }
            Some("avatar") => {
                let content_type = field
                    .content_type()
                    .map(ToString::to_string)
                    .ok_or_else(|| ServerError::Generic("avatar needs a content type".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::Generic(e.body_text()))?;
                if bytes.is_empty() {
                    continue;
                }
                let blob = state.blobs.upload(bytes.to_vec(), &content_type).await?;
                patch.avatar = Some(AvatarRef {
                    id: blob.id,
                    url: blob.url,
                });
            }
            _ => {}
        }
    }

    let new_avatar_id = patch.avatar.as_ref().map(|a| a.id.clone());
    let update = match state.engine.update_profile(user.id, patch).await {
        Ok(update) => update,
        Err(err) => {
            if let Some(id) = new_avatar_id
                && let Err(cleanup) = state.blobs.delete(&id).await
            {
                tracing::warn!(blob_id = %id, "failed to remove orphan avatar: {cleanup:?}");
            }
            return Err(err.into());
        }
    };

    if let Some(old_id) = update.replaced_avatar_id
        && let Err(err) = state.blobs.delete(&old_id).await
    {
        tracing::warn!(blob_id = %old_id, "failed to remove replaced avatar: {err:?}");
    }
    Ok(Json(user_view(update.user)))
}

pub async fn change_password(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .engine
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

/// Always answers the same way for known and unknown emails.
pub async fn request_reset(
    State(state): State<ServerState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .engine
        .request_password_reset(&payload.email, &state.reset_url)
        .await?;
    Ok(Json(MessageResponse {
        message: "If the email is registered, a reset link has been sent".to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<ServerState>,
    Path(token): Path<String>,
    Json(payload): Json<PasswordReset>,
) -> Result<Json<MessageResponse>, ServerError> {
    state
        .engine
        .reset_password(&token, &payload.password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password reset".to_string(),
    }))
}
