#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{Account, Engine, NewAccount, RecordingNotifier};
use migration::MigratorTrait;

pub struct Harness {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub notifier: RecordingNotifier,
}

pub async fn harness() -> Harness {
    harness_at("sqlite::memory:").await
}

/// Harness over a fresh SQLite file, so the pool holds several connections.
/// The file is removed when the returned guard drops.
pub async fn file_harness() -> (Harness, TempDb) {
    let path = std::env::temp_dir().join(format!("kharcha-test-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    (harness_at(&url).await, TempDb(path))
}

pub struct TempDb(PathBuf);

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.0.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

async fn harness_at(url: &str) -> Harness {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let notifier = RecordingNotifier::new();
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(Arc::new(notifier.clone()))
        .build()
        .await
        .unwrap();
    Harness {
        engine,
        db,
        notifier,
    }
}

/// Inserts a user row directly, skipping password hashing.
pub async fn insert_user(db: &DatabaseConnection, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (id, email, full_name, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
        vec![
            id.to_string().into(),
            email.into(),
            "Test User".into(),
            "not-a-hash".into(),
            now.into(),
            now.into(),
        ],
    ))
    .await
    .unwrap();
    id
}

pub async fn open_account(engine: &Engine, user_id: Uuid, number: &str, balance: i64) -> Account {
    engine
        .create_account(
            user_id,
            NewAccount {
                account_type: "Savings".to_string(),
                branch_name: "MG Road".to_string(),
                account_number: number.to_string(),
                bank_name: "Canara".to_string(),
                balance_minor: balance,
            },
        )
        .await
        .unwrap()
}

pub async fn balance(engine: &Engine, account_id: Uuid, user_id: Uuid) -> i64 {
    engine
        .account(account_id, user_id)
        .await
        .unwrap()
        .balance_minor
}
