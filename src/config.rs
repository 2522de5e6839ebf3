use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub session_expiry_hours: i64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    /// Root directory of the resume bucket.
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Mark new identities as email-verified at signup.
    pub auto_verify_signups: bool,
    /// Answer bootstrap with the identity's role claim when the profile lookup fails.
    pub allow_claim_fallback: bool,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite://hireloop.db?mode=rwc".to_string(),
            session_expiry_hours: 24,
            db_max_connections: 20,
            db_min_connections: 5,
            request_timeout_secs: 30,
            storage_dir: PathBuf::from("./storage/resumes"),
            max_upload_bytes: 5 * 1024 * 1024,
            auto_verify_signups: true,
            allow_claim_fallback: true,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Config::default();

        Ok(Config {
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            session_expiry_hours: parse_var("SESSION_EXPIRY_HOURS", defaults.session_expiry_hours)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", defaults.db_min_connections)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            storage_dir: std::env::var("HIRELOOP_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            max_upload_bytes: parse_var("HIRELOOP_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            auto_verify_signups: parse_flag("HIRELOOP_AUTO_VERIFY", defaults.auto_verify_signups)?,
            allow_claim_fallback: parse_flag(
                "HIRELOOP_ALLOW_CLAIM_FALLBACK",
                defaults.allow_claim_fallback,
            )?,
            log_json: parse_flag("HIRELOOP_LOG_JSON", defaults.log_json)?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(key: &str, default: bool) -> Result<bool, AppError> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::Config(format!("Invalid {}: {}", key, other))),
        },
        Err(_) => Ok(default),
    }
}
