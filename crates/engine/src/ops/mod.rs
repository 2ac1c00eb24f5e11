use std::{fmt, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{Mailer, NOTIFICATION_EVENT, NoopMailer, NoopNotifier, Notifier, ResultEngine};

mod access;
mod accounts;
mod balances;
mod bills;
mod expenses;
mod goals;
mod transactions;
mod users;

pub use accounts::AccountDetail;
pub use balances::BalanceDrift;
pub use transactions::TransactionSummary;
pub use users::ProfileUpdate;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
    mailer: Arc<dyn Mailer>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Emit a notification. Only call this after the write has committed.
    fn notify(&self, message: String) {
        tracing::debug!(%message, "notification");
        self.notifier.broadcast(NOTIFICATION_EVENT, message);
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn Notifier>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Sink for post-commit notifications. Defaults to [`NoopNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Outbound email for reset links. Defaults to [`NoopMailer`].
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> EngineBuilder {
        self.mailer = Some(mailer);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier)),
            mailer: self.mailer.unwrap_or_else(|| Arc::new(NoopMailer)),
        })
    }
}
