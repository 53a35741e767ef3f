//! Application configuration loaded from environment variables.

use mysql_async::OptsBuilder;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Database Connection ===
    /// Database host name or IP address.
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// Database TCP port.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Database user.
    pub db_user: String,

    /// Database password.
    #[serde(default)]
    pub db_password: String,

    /// Database (schema) name holding the `patients` and `providers` tables.
    pub db_name: String,

    /// Session `group_concat_max_len`, applied once when the connection opens.
    #[serde(default)]
    pub group_concat_max_len: Option<u64>,

    /// Keep serving when the initial connection fails.
    #[serde(default)]
    pub allow_degraded_start: bool,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port for the Prometheus scrape endpoint, disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.db_host.trim().is_empty() {
            return Err("DB_HOST must not be empty".to_string());
        }

        if self.db_user.trim().is_empty() {
            return Err("DB_USER is required".to_string());
        }

        if self.db_name.trim().is_empty() {
            return Err("DB_NAME is required".to_string());
        }

        if self.port == 0 {
            return Err("PORT must be greater than 0".to_string());
        }

        if self.metrics_port == Some(self.port) {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        Ok(())
    }

    /// Connection options for the store.
    pub fn mysql_opts(&self) -> OptsBuilder {
        let mut init = Vec::new();
        if let Some(len) = self.group_concat_max_len {
            init.push(format!("SET SESSION group_concat_max_len = {}", len));
        }

        OptsBuilder::default()
            .ip_or_hostname(self.db_host.clone())
            .tcp_port(self.db_port)
            .user(Some(self.db_user.clone()))
            .pass(Some(self.db_password.clone()))
            .db_name(Some(self.db_name.clone()))
            .init(init)
    }

    /// Store location without credentials, safe for logs.
    pub fn db_location(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.db_user, self.db_host, self.db_port, self.db_name
        )
    }
}
