//! Application settings.
//!
//! Values are read from an optional `settings.toml` next to the binary and
//! can be overridden with `KHARCHA__SECTION__KEY` environment variables,
//! e.g. `KHARCHA__AUTH__JWT_SECRET`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Database,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Raw (at least 32 bytes) or base64-encoded HS256 secret.
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Page that receives the reset token as its last path segment.
    #[serde(default = "default_reset_url")]
    pub reset_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Smtp {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    #[serde(default = "default_smtp_tls")]
    pub tls: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub auth: Auth,
    /// Without it reset emails are logged and dropped.
    pub smtp: Option<Smtp>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_token_ttl() -> u64 {
    60 * 60
}

fn default_reset_url() -> String {
    "http://localhost:5173/reset-password".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> bool {
    true
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("KHARCHA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
