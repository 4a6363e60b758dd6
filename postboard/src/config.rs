use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://postboard.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(
    name = "postboard",
    version,
    about = "Minimal users-and-posts JSON API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, value_name = "ADDR", global = true)]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_name = "URL", global = true)]
    pub database_url: Option<String>,

    #[arg(long, value_name = "COUNT", global = true)]
    pub max_connections: Option<u32>,

    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default).
    #[default]
    Serve,
    /// Create the users and posts tables if they do not exist.
    Migrate,
    /// Insert the development fixture users, or remove all users with `--undo`.
    Seed {
        #[arg(long)]
        undo: bool,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub log_statements: bool,
}

impl DatabaseConfig {
    /// Backend name derived from the URL scheme, safe to log.
    pub fn backend_name(&self) -> &str {
        self.url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid boolean value for env var {key}: {value}")]
    InvalidEnvBool { key: String, value: String },
    #[error("invalid value for env var {key}: not valid unicode")]
    InvalidEnvString { key: String },
    #[error("invalid connect_timeout {value:?}: {source}")]
    InvalidTimeout {
        value: String,
        source: humantime::DurationError,
    },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    #[serde(default)]
    database: FileDatabaseConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileDatabaseConfig {
    url: Option<String>,
    max_connections: Option<u32>,
    min_connections: Option<u32>,
    connect_timeout: Option<String>,
    log_statements: Option<bool>,
}

#[derive(Debug, Default)]
struct EnvConfig {
    database_url: Option<String>,
    log_statements: Option<bool>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        let from_env = read_env_config()?;
        resolve(cli, from_file, from_env)
    }
}

fn resolve(
    cli: Cli,
    from_file: FileConfig,
    from_env: EnvConfig,
) -> Result<AppConfig, ConfigError> {
    let bind = cli
        .bind
        .or(from_file.bind)
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

    let file_db = from_file.database;
    let url = cli
        .database_url
        .or(from_env.database_url)
        .or(file_db.url)
        .unwrap_or_else(|| String::from(DEFAULT_DATABASE_URL));
    let max_connections = cli
        .max_connections
        .or(file_db.max_connections)
        .unwrap_or(10)
        .max(1);
    let min_connections = file_db.min_connections.unwrap_or(1).min(max_connections);
    let connect_timeout = match file_db.connect_timeout {
        Some(raw) => humantime::parse_duration(raw.trim())
            .map_err(|source| ConfigError::InvalidTimeout { value: raw, source })?,
        None => Duration::from_secs(8),
    };
    let log_statements = from_env
        .log_statements
        .or(file_db.log_statements)
        .unwrap_or(false);

    Ok(AppConfig {
        bind,
        database: DatabaseConfig {
            url,
            max_connections,
            min_connections,
            connect_timeout,
            log_statements,
        },
    })
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env_config() -> Result<EnvConfig, ConfigError> {
    Ok(EnvConfig {
        database_url: read_env_string("DATABASE_URL")?,
        log_statements: read_env_bool("POSTBOARD_LOG_SQL")?,
    })
}

fn read_env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvString {
            key: String::from(key),
        }),
    }
}

fn read_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_bool_value(key, &value).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from("<non-unicode>"),
        }),
    }
}

fn parse_bool_value(key: &str, raw: &str) -> Result<bool, ConfigError> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvBool {
            key: String::from(key),
            value: String::from(raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::{
        parse_bool_value, read_file_config, resolve, Cli, Command, EnvConfig, FileConfig,
    };

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["postboard"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap_or_else(|e| panic!("cli args must parse: {e}"))
    }

    #[test]
    fn parse_bool_value_accepts_common_true_values() {
        assert_eq!(parse_bool_value("K", "true").ok(), Some(true));
        assert_eq!(parse_bool_value("K", "1").ok(), Some(true));
        assert_eq!(parse_bool_value("K", "YES").ok(), Some(true));
        assert_eq!(parse_bool_value("K", " on ").ok(), Some(true));
    }

    #[test]
    fn parse_bool_value_accepts_common_false_values() {
        assert_eq!(parse_bool_value("K", "false").ok(), Some(false));
        assert_eq!(parse_bool_value("K", "0").ok(), Some(false));
        assert_eq!(parse_bool_value("K", "NO").ok(), Some(false));
        assert_eq!(parse_bool_value("K", " off ").ok(), Some(false));
    }

    #[test]
    fn parse_bool_value_rejects_invalid_values() {
        assert!(parse_bool_value("K", "maybe").is_err());
    }

    #[test]
    fn defaults_listen_on_port_5000_with_local_sqlite() {
        let config = resolve(cli(&[]), FileConfig::default(), EnvConfig::default())
            .unwrap_or_else(|e| panic!("defaults must resolve: {e}"));
        assert_eq!(config.bind.port(), 5000);
        assert_eq!(config.database.backend_name(), "sqlite");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.connect_timeout, Duration::from_secs(8));
        assert!(!config.database.log_statements);
    }

    #[test]
    fn cli_url_wins_over_env_and_file() {
        let file: FileConfig = toml::from_str("[database]\nurl = \"sqlite://file.db\"\n")
            .unwrap_or_else(|e| panic!("file config must parse: {e}"));
        let env = EnvConfig {
            database_url: Some(String::from("postgres://env/db")),
            log_statements: None,
        };

        let config = resolve(cli(&["--database-url", "sqlite::memory:"]), file, env)
            .unwrap_or_else(|e| panic!("config must resolve: {e}"));
        assert_eq!(config.database.url, "sqlite::memory:");

        let file: FileConfig = toml::from_str("[database]\nurl = \"sqlite://file.db\"\n")
            .unwrap_or_else(|e| panic!("file config must parse: {e}"));
        let env = EnvConfig {
            database_url: Some(String::from("postgres://env/db")),
            log_statements: None,
        };
        let config = resolve(cli(&[]), file, env)
            .unwrap_or_else(|e| panic!("config must resolve: {e}"));
        assert_eq!(config.database.url, "postgres://env/db");
        assert_eq!(config.database.backend_name(), "postgres");
    }

    #[test]
    fn file_config_sets_pool_and_timeout() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let path = dir.path().join("postboard.toml");
        std::fs::write(
            &path,
            r#"
bind = "127.0.0.1:8080"

[database]
max_connections = 4
min_connections = 9
connect_timeout = "250ms"
log_statements = true
"#,
        )
        .unwrap_or_else(|e| panic!("write config: {e}"));

        let file = read_file_config(Some(&path)).unwrap_or_else(|e| panic!("read config: {e}"));
        let config = resolve(cli(&[]), file, EnvConfig::default())
            .unwrap_or_else(|e| panic!("config must resolve: {e}"));

        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.min_connections, 4);
        assert_eq!(config.database.connect_timeout, Duration::from_millis(250));
        assert!(config.database.log_statements);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let file: FileConfig = toml::from_str("[database]\nconnect_timeout = \"soon\"\n")
            .unwrap_or_else(|e| panic!("file config must parse: {e}"));
        assert!(resolve(cli(&[]), file, EnvConfig::default()).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        assert!(read_file_config(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn seed_subcommand_parses_undo_flag() {
        let parsed = cli(&["seed", "--undo"]);
        assert!(matches!(parsed.command, Some(Command::Seed { undo: true })));
        assert!(cli(&[]).command.is_none());
    }
}
