use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, accounts, bills, expenses, goals, transactions, users};

use super::Engine;

/// Generates a `require_*` lookup that loads a row by id and owner.
///
/// A row owned by another user is reported exactly like a missing one.
macro_rules! impl_require_owned {
    ($require_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            id: Uuid,
            user_id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(id.to_string())
                .filter($module::Column::UserId.eq(user_id.to_string()))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($label.to_string()))
        }
    };
}

impl Engine {
    impl_require_owned!(require_account, accounts, "account");
    impl_require_owned!(require_transaction, transactions, "transaction");
    impl_require_owned!(require_bill, bills, "bill");
    impl_require_owned!(require_goal, goals, "goal");
    impl_require_owned!(require_expense, expenses, "expense");

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user".to_string()))
    }
}
