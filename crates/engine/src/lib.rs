//! Kharcha engine: personal-finance records and the ledger that keeps account
//! balances consistent with their transactions.
//!
//! All money is `i64` minor units. Every public operation is scoped by the
//! caller's user id; rows owned by someone else behave as if they do not
//! exist.

pub use accounts::Account;
pub use analytics::{Bucket, CategoryBreakdown, CompareFilter};
pub use bills::Bill;
pub use commands::{
    AccountPatch, AvatarRef, BillPatch, ExpensePatch, GoalPatch, NewAccount, NewBill, NewExpense,
    NewGoal, NewTransaction, NewUser, ProfilePatch, TransactionPatch,
};
pub use error::EngineError;
pub use expenses::Expense;
pub use goals::Goal;
pub use mailer::{MailMessage, Mailer, NoopMailer, RecordingMailer};
pub use money::{MAX_AMOUNT_MINOR, Money};
pub use notifier::{NOTIFICATION_EVENT, NoopNotifier, Notifier, RecordingNotifier};
pub use ops::{
    AccountDetail, BalanceDrift, Engine, EngineBuilder, ProfileUpdate, TransactionSummary,
};
pub use password::{MIN_PASSWORD_LEN, RESET_TOKEN_TTL};
pub use transactions::{PaymentMethod, Transaction, TransactionKind, TransactionStatus};
pub use users::User;

mod accounts;
pub mod analytics;
mod bills;
pub mod calendar;
mod commands;
mod error;
mod expenses;
mod goals;
mod mailer;
mod money;
mod notifier;
mod ops;
mod password;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
