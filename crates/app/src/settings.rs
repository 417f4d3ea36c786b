//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then from `TREASURY__*` environment variables
//! (for example `TREASURY__SERVER__PORT=8080`).
//!
//! See `settings.example.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use ledger::LedgerSettings;
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

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
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
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize)]
pub struct Notarization {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for Notarization {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub notarization: Notarization,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("TREASURY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
