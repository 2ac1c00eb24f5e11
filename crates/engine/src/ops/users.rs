use chrono::Utc;
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, MailMessage, NewUser, ProfilePatch, RESET_TOKEN_TTL, ResultEngine, User,
    password::{
        generate_reset_token, hash_password, hash_reset_token, validate_password, verify_password,
    },
    users,
    util::{normalize_email, normalize_required_text},
};

use super::{Engine, with_tx};

/// Result of a profile update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub user: User,
    /// Blob id of the avatar that was replaced, to be removed by the caller.
    pub replaced_avatar_id: Option<String>,
}

impl Engine {
    /// Creates a local user with an argon2-hashed password.
    pub async fn register(&self, cmd: NewUser) -> ResultEngine<User> {
        let email = normalize_email(&cmd.email)?;
        let full_name = normalize_required_text(&cmd.full_name, "full_name")?;
        validate_password(&cmd.password)?;
        let password_hash = hash_password(&cmd.password)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            full_name,
            avatar_id: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(user.email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(format!("email {}", user.email)));
            }
            user.active_model(password_hash).insert(&db_tx).await?;
            Ok(())
        });
        result?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Checks credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = normalize_email(email).map_err(|_| EngineError::InvalidCredentials)?;
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or(EngineError::InvalidCredentials)?;
        verify_password(password, &model.password_hash)?;
        User::try_from(model)
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = self.require_user(&self.database, user_id).await?;
        User::try_from(model)
    }

    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user".to_string()))?;
        User::try_from(model)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> ResultEngine<ProfileUpdate> {
        let full_name = patch
            .full_name
            .as_deref()
            .map(|v| normalize_required_text(v, "full_name"))
            .transpose()?;

        let result: ResultEngine<ProfileUpdate> = with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let mut user = User::try_from(model.clone())?;
            let mut replaced_avatar_id = None;
            if let Some(full_name) = full_name {
                user.full_name = full_name;
            }
            if let Some(avatar) = patch.avatar {
                replaced_avatar_id = user.avatar_id.replace(avatar.id);
                user.avatar_url = Some(avatar.url);
            }
            user.updated_at = Utc::now();

            let mut active = model.into_active_model();
            active.full_name = ActiveValue::Set(user.full_name.clone());
            active.avatar_id = ActiveValue::Set(user.avatar_id.clone());
            active.avatar_url = ActiveValue::Set(user.avatar_url.clone());
            active.updated_at = ActiveValue::Set(user.updated_at);
            active.update(&db_tx).await?;
            Ok(ProfileUpdate {
                user,
                replaced_avatar_id,
            })
        });
        result
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        validate_password(new_password)?;
        let result: ResultEngine<()> = with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            verify_password(old_password, &model.password_hash)?;
            let password_hash = hash_password(new_password)?;

            let mut active = model.into_active_model();
            active.password_hash = ActiveValue::Set(password_hash);
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await?;
            Ok(())
        });
        result?;

        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    /// Emails a single-use reset link `{link_base}/{token}` to `email`.
    ///
    /// Unknown addresses succeed without sending anything. If delivery fails
    /// the stored token is cleared again and [`EngineError::Mail`] is returned.
    pub async fn request_password_reset(&self, email: &str, link_base: &str) -> ResultEngine<()> {
        let email = normalize_email(email)?;
        let Some(model) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
        else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        let (token, token_hash) = generate_reset_token();
        let to = model.email.clone();
        let user_id = model.id.clone();
        let mut active = model.into_active_model();
        active.reset_token_hash = ActiveValue::Set(Some(token_hash.clone()));
        active.reset_token_expires_at = ActiveValue::Set(Some(Utc::now() + RESET_TOKEN_TTL));
        active.update(&self.database).await?;

        let link = format!("{}/{token}", link_base.trim_end_matches('/'));
        let message = MailMessage {
            to,
            subject: "Password reset".to_string(),
            html: format!(
                "<p>You asked to reset your Kharcha password.</p>\
                 <p><a href=\"{link}\">{link}</a></p>\
                 <p>The link expires in {} minutes.</p>",
                RESET_TOKEN_TTL.num_minutes()
            ),
        };
        if let Err(err) = self.mailer.send(message).await {
            users::Entity::update_many()
                .col_expr(users::Column::ResetTokenHash, Expr::value(Option::<String>::None))
                .col_expr(
                    users::Column::ResetTokenExpiresAt,
                    Expr::value(Option::<DateTimeUtc>::None),
                )
                .filter(users::Column::Id.eq(user_id.as_str()))
                .filter(users::Column::ResetTokenHash.eq(token_hash))
                .exec(&self.database)
                .await?;
            return Err(err);
        }

        tracing::info!(%user_id, "password reset link sent");
        Ok(())
    }

    /// Sets a new password using an emailed reset token. The token is
    /// consumed; expired or unknown tokens fail with a validation error.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> ResultEngine<()> {
        validate_password(new_password)?;
        let invalid = || EngineError::Validation("reset token is invalid or expired".to_string());
        let token_hash = hash_reset_token(token);
        let now = Utc::now();

        let model = users::Entity::find()
            .filter(users::Column::ResetTokenHash.eq(token_hash.as_str()))
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        if model.reset_token_expires_at.is_none_or(|expires_at| expires_at <= now) {
            return Err(invalid());
        }

        let password_hash = hash_password(new_password)?;
        // Conditional on the hash so a token can only be spent once.
        let updated = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::ResetTokenHash, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::ResetTokenExpiresAt,
                Expr::value(Option::<DateTimeUtc>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(model.id.as_str()))
            .filter(users::Column::ResetTokenHash.eq(token_hash))
            .exec(&self.database)
            .await?;
        if updated.rows_affected == 0 {
            return Err(invalid());
        }

        tracing::info!(user_id = %model.id, "password reset");
        Ok(())
    }
}
