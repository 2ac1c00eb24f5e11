//! JSON request and response bodies of the Kharcha HTTP API.
//!
//! Money is always `*_minor` integer units. Request timestamps are RFC3339
//! with an offset; responses are UTC.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Generic acknowledgement, e.g. logout or password change.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRegister {
        pub email: String,
        pub password: String,
        pub full_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserLogin {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub access_token: String,
        pub token_type: String,
        /// Seconds until the token expires.
        pub expires_in: u64,
        pub user: UserView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub old_password: String,
        pub new_password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordResetRequest {
        pub email: String,
    }

    /// New password, sent to the emailed reset link.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordReset {
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub email: String,
        pub full_name: String,
        pub avatar_url: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub account_type: String,
        pub branch_name: String,
        pub account_number: String,
        pub bank_name: String,
        /// Opening balance, may be negative.
        #[serde(default)]
        pub balance_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub account_type: Option<String>,
        pub branch_name: Option<String>,
        pub account_number: Option<String>,
        pub bank_name: Option<String>,
        /// Direct balance edit.
        pub balance_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub account_type: String,
        pub branch_name: String,
        pub account_number: String,
        pub bank_name: String,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountDetail {
        pub account: AccountView,
        pub transactions: Vec<super::transaction::TransactionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceDriftView {
        pub account_id: Uuid,
        pub stored_minor: i64,
        pub expected_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconcileResponse {
        pub repaired: Vec<BalanceDriftView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
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

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TransactionStatus {
        Pending,
        Complete,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        pub kind: TransactionKind,
        /// Must be > 0. The kind defines the sign of the balance change.
        pub amount_minor: i64,
        pub title: Option<String>,
        pub shop: Option<String>,
        pub category: Option<String>,
        /// Optional: if absent, server uses now().
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub method: Option<PaymentMethod>,
        pub status: Option<TransactionStatus>,
        pub receipt: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub account_id: Option<Uuid>,
        pub kind: Option<TransactionKind>,
        pub amount_minor: Option<i64>,
        pub title: Option<String>,
        pub shop: Option<String>,
        pub category: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub method: Option<PaymentMethod>,
        pub status: Option<TransactionStatus>,
        pub receipt: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
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
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionSummary {
        pub total_balance_minor: i64,
        pub total_revenues_minor: i64,
        pub total_expenses_minor: i64,
    }
}

pub mod bill {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillNew {
        pub vendor: String,
        pub plan: Option<String>,
        pub due_date: DateTime<FixedOffset>,
        pub amount_minor: i64,
        pub logo_url: Option<String>,
        pub last_charge_date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BillUpdate {
        pub vendor: Option<String>,
        pub plan: Option<String>,
        pub due_date: Option<DateTime<FixedOffset>>,
        pub amount_minor: Option<i64>,
        pub logo_url: Option<String>,
        pub last_charge_date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BillView {
        pub id: Uuid,
        pub vendor: String,
        pub plan: Option<String>,
        pub due_date: DateTime<Utc>,
        pub amount_minor: i64,
        pub logo_url: Option<String>,
        pub last_charge_date: Option<DateTime<Utc>>,
    }
}

pub mod goal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        pub title: String,
        pub target_amount_minor: i64,
        #[serde(default)]
        pub current_amount_minor: i64,
        pub deadline: DateTime<FixedOffset>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub title: Option<String>,
        pub target_amount_minor: Option<i64>,
        pub current_amount_minor: Option<i64>,
        pub deadline: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: Uuid,
        pub title: String,
        pub target_amount_minor: i64,
        pub current_amount_minor: i64,
        /// Completion in whole percent, capped at 100.
        pub progress_percent: u8,
        pub deadline: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        pub category: String,
        pub amount_minor: i64,
        /// Optional: if absent, server uses now().
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub account_id: Option<Uuid>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub title: Option<String>,
        pub category: Option<String>,
        pub amount_minor: Option<i64>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        pub account_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub title: String,
        pub category: String,
        pub amount_minor: i64,
        pub occurred_at: DateTime<Utc>,
        pub account_id: Option<Uuid>,
    }

    /// Query string of the comparison endpoint.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ComparisonQuery {
        /// `daily`, `weekly`, `monthly` (default) or `yearly`.
        pub filter: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BucketView {
        pub label: String,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ComparisonResponse {
        pub filter: String,
        pub data: Vec<BucketView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub category: String,
        pub total_minor: i64,
        pub change_percent: i64,
        pub items: Vec<ExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BreakdownResponse {
        pub data: Vec<CategoryView>,
    }
}

pub mod notification {
    use super::*;

    /// Payload of one server-sent `notification` event.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct NotificationView {
        pub message: String,
        pub time: DateTime<Utc>,
    }
}
