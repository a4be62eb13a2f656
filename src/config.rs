use anyhow::{Context, Result};
use axum::http::HeaderValue;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// sqlx connection string, e.g. `sqlite:./data/insights.sqlite`.
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_url() -> String {
    "sqlite:./data/insights.sqlite".to_string()
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// The single origin allowed to make credentialed cross-origin requests.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_seed_path")]
    pub path: PathBuf,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            path: default_seed_path(),
        }
    }
}

fn default_seed_path() -> PathBuf {
    PathBuf::from("./jsondata.json")
}

impl Config {
    /// Apply `DATABASE_URL`, `HOST`, `PORT`, `CORS_ORIGIN` and `SEED_FILE`
    /// on top of the file values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.db.url = url;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", port))?;
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(path) = lookup("SEED_FILE") {
            self.seed.path = PathBuf::from(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.db.url.trim().is_empty() {
            anyhow::bail!("db.url must not be empty");
        }
        if self.db.max_connections == 0 {
            anyhow::bail!("db.max_connections must be >= 1");
        }
        if self.server.cors_origin.parse::<HeaderValue>().is_err() {
            anyhow::bail!(
                "server.cors_origin is not a valid origin: '{}'",
                self.server.cors_origin
            );
        }
        Ok(())
    }
}

/// Load configuration from `path` (built-in defaults if the file does not
/// exist), then apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = read_config_file(path)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| "Failed to parse config file")
}
