//! Configuration module for the loyalty tracker backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_SEED_MEMBERS: &str = "Osvandré,Marilise,Graciela,Leonardo";

/// Which document store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// SQLite file at `db_path`
    Sqlite,
    /// Process-local maps, lost on restart
    Memory,
}

impl StorageKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backing store selection
    pub storage: StorageKind,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Plain text or JSON log lines
    pub log_format: LogFormat,
    /// Family members created at startup when missing
    pub seed_members: Vec<String>,
    /// Page size of `GET /api/global-log` when no limit is given
    pub global_log_limit: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let storage_raw = env::var("MILHAS_STORAGE").unwrap_or_else(|_| "sqlite".to_string());
        let storage = StorageKind::parse(&storage_raw)
            .ok_or_else(|| format!("Invalid MILHAS_STORAGE value: {}", storage_raw))?;

        let db_path = env::var("MILHAS_DB_PATH")
            .unwrap_or_else(|_| "./data/milhas.sqlite".to_string())
            .into();

        let bind_addr = env::var("MILHAS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8001".to_string())
            .parse()
            .map_err(|e| format!("Invalid MILHAS_BIND_ADDR format: {}", e))?;

        let log_level = env::var("MILHAS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("MILHAS_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let seed_members = parse_name_list(
            &env::var("MILHAS_SEED_MEMBERS").unwrap_or_else(|_| DEFAULT_SEED_MEMBERS.to_string()),
        );

        let global_log_limit = match env::var("MILHAS_GLOBAL_LOG_LIMIT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| format!("Invalid MILHAS_GLOBAL_LOG_LIMIT: {}", e))?,
            Err(_) => 100,
        };

        Ok(Self {
            storage,
            db_path,
            bind_addr,
            log_level,
            log_format,
            seed_members,
            global_log_limit,
        })
    }
}

fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("MILHAS_STORAGE");
        env::remove_var("MILHAS_DB_PATH");
        env::remove_var("MILHAS_BIND_ADDR");
        env::remove_var("MILHAS_LOG_LEVEL");
        env::remove_var("MILHAS_LOG_FORMAT");
        env::remove_var("MILHAS_SEED_MEMBERS");
        env::remove_var("MILHAS_GLOBAL_LOG_LIMIT");

        let config = Config::from_env().unwrap();

        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("./data/milhas.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8001");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.seed_members,
            vec!["Osvandré", "Marilise", "Graciela", "Leonardo"]
        );
        assert_eq!(config.global_log_limit, 100);
    }

    #[test]
    fn test_name_list_skips_blanks() {
        assert_eq!(parse_name_list(" Ana , ,Bia,"), vec!["Ana", "Bia"]);
        assert!(parse_name_list("").is_empty());
    }

    #[test]
    fn test_storage_kind_parse() {
        assert_eq!(StorageKind::parse("Memory"), Some(StorageKind::Memory));
        assert_eq!(StorageKind::parse("sqlite"), Some(StorageKind::Sqlite));
        assert_eq!(StorageKind::parse("mongo"), None);
    }
}
