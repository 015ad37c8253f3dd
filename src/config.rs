use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    /// Root of the content directory. Signer photos live in `signers/` below it.
    pub content_dir: PathBuf,
    /// Prefix for absolute file URLs handed to clients, e.g. `https://verify.example.org`.
    pub public_base_url: String,
    pub max_request_bytes: usize,
    pub io_timeout: Duration,
    pub db_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        Self {
            database_url,
            jwt_secret,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000"),
            content_dir: PathBuf::from(try_load::<String>("CONTENT_DIR", "uploads")),
            public_base_url: try_load::<String>("PUBLIC_BASE_URL", "")
                .trim_end_matches('/')
                .to_string(),
            max_request_bytes: try_load("MAX_REQUEST_BYTES", &(64 * MIB).to_string()),
            io_timeout: Duration::from_secs(try_load("IO_TIMEOUT_SECS", "30")),
            db_timeout: Duration::from_secs(try_load("DB_TIMEOUT_SECS", "30")),
        }
    }

    /// Defaults for everything except the connection and signing secret.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            bind_addr: "0.0.0.0:3000".to_string(),
            content_dir: PathBuf::from("uploads"),
            public_base_url: String::new(),
            max_request_bytes: 64 * MIB,
            io_timeout: Duration::from_secs(30),
            db_timeout: Duration::from_secs(30),
        }
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.content_dir.join("signers")
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_or_default(key, &raw, default)
}

fn parse_or_default<T: FromStr>(key: &str, raw: &str, default: &str) -> T
where
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
                .parse()
                .unwrap_or_else(|_| panic!("default for {key} must parse"))
        }
    }
}
