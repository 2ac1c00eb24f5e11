use std::{path::PathBuf, sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use engine::{Mailer, NoopMailer};
use server::{
    AuthConfig, AuthManager, EventBus, LocalBlobStore, ServerState, SmtpConfig, SmtpMailer,
};
use settings::Database;
use thiserror::Error;

mod settings;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid settings: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("engine error: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("invalid auth settings: {0}")]
    Auth(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kharcha={level},server={level},engine={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    let mailer: Arc<dyn Mailer> = match &settings.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(&SmtpConfig {
            host: smtp.host.clone(),
            port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            from: smtp.from.clone(),
            tls: smtp.tls,
        })?),
        None => {
            tracing::warn!("no [smtp] settings, password reset emails will not be delivered");
            Arc::new(NoopMailer)
        }
    };

    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let engine = engine::Engine::builder()
        .database(db)
        .notifier(Arc::new(events.clone()))
        .mailer(mailer)
        .build()
        .await?;

    let secret = server::decode_secret_key(&settings.auth.jwt_secret).map_err(AppError::Auth)?;
    let auth = AuthManager::new(&AuthConfig {
        jwt_secret: secret,
        access_token_ttl: Duration::from_secs(settings.auth.token_ttl_secs),
    });

    let upload_dir = PathBuf::from(&settings.server.upload_dir);
    tokio::fs::create_dir_all(&upload_dir).await?;

    let state = ServerState {
        engine: Arc::new(engine),
        auth: Arc::new(auth),
        events,
        blobs: Arc::new(LocalBlobStore::new(upload_dir.clone(), "/uploads")),
        upload_dir,
        reset_url: settings.auth.reset_url.clone(),
    };

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting kharcha on {addr}");
    server::run_with_listener(state, listener).await?;

    Ok(())
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection, AppError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
