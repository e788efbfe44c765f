use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Outer request timeout in seconds, enforced by the router
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-storage-call deadline in seconds
    #[serde(default = "default_db_timeout_secs")]
    pub db_timeout_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// TLS certificate material
    #[serde(default)]
    pub tls: TlsConfig,

    /// Backing PostgreSQL server
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Paths to the PEM-encoded certificate chain and private key
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    #[serde(default = "default_cert_path")]
    pub cert_path: String,

    #[serde(default = "default_key_path")]
    pub key_path: String,
}

/// Connection parameters for the backing PostgreSQL server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    /// Empty means no password is sent
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub dbname: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            db_timeout_secs: default_db_timeout_secs(),
            log_level: default_log_level(),
            tls: TlsConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            dbname: default_db_name(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `orchard` config file, overridden
    /// by `ORCHARD`-prefixed environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("orchard").required(false))
            .add_source(config::Environment::with_prefix("ORCHARD").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get the outer request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the per-storage-call deadline as Duration
    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }
}

impl DatabaseConfig {
    /// Render the keyword/value connection string understood by the driver.
    pub fn conn_string(&self) -> String {
        let mut s = format!(
            "host={} port={} user={} dbname={} sslmode=disable",
            self.host, self.port, self.user, self.dbname
        );
        if !self.password.is_empty() {
            s.push_str(&format!(" password={}", self.password));
        }
        s
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8443
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_db_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cert_path() -> String {
    "cert.pem".to_string()
}

fn default_key_path() -> String {
    "key.pem".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "postgres".to_string()
}
