//! Transaction primitives.
//!
//! A `Transaction` is an income or expense event applied to exactly one
//! `Account`. The amount is stored as a positive magnitude; the direction of
//! the balance change is derived from `kind` alone.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, money::ensure_in_range, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Signed balance effect of a transaction of this kind.
    ///
    /// Income adds to the balance, expense subtracts from it.
    #[must_use]
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Income => amount_minor,
            Self::Expense => -amount_minor,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    Cash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Cash => "Cash",
            Self::BankTransfer => "Bank Transfer",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Credit Card" => Ok(Self::CreditCard),
            "Debit Card" => Ok(Self::DebitCard),
            "Cash" => Ok(Self::Cash),
            "Bank Transfer" => Ok(Self::BankTransfer),
            other => Err(EngineError::Validation(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    #[default]
    Complete,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Complete => "Complete",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Pending" => Ok(Self::Pending),
            "Complete" => Ok(Self::Complete),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub title: Option<String>,
    pub shop: Option<String>,
    pub category: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub method: Option<PaymentMethod>,
    pub status: TransactionStatus,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Balance delta this transaction contributes to its account.
    #[must_use]
    pub fn signed_amount(&self) -> i64 {
        self.kind.signed(self.amount_minor)
    }
}

/// Rejects amounts that are not a strictly positive magnitude of at most
/// [`MAX_AMOUNT_MINOR`](crate::MAX_AMOUNT_MINOR).
pub(crate) fn validate_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    ensure_in_range(amount_minor, "amount_minor")
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub title: Option<String>,
    pub shop: Option<String>,
    pub category: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub method: Option<String>,
    pub status: String,
    pub receipt: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            title: ActiveValue::Set(tx.title.clone()),
            shop: ActiveValue::Set(tx.shop.clone()),
            category: ActiveValue::Set(tx.category.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            method: ActiveValue::Set(tx.method.map(|m| m.as_str().to_string())),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            receipt: ActiveValue::Set(tx.receipt.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            title: model.title,
            shop: model.shop,
            category: model.category,
            occurred_at: model.occurred_at,
            method: model
                .method
                .as_deref()
                .map(PaymentMethod::try_from)
                .transpose()?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            receipt: model.receipt,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
