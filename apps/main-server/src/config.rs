//! Server configuration.

use std::{env, fmt, str::FromStr};

use anyhow::{anyhow, bail, Context};

/// Minimum accepted length of the JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown log format {other:?}, expected text or json")),
        }
    }
}

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store, lost on restart.
    Memory,
    /// SQLite database at the given sqlx URL.
    Sqlite(String),
}

/// Administrator account created at startup when missing.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("email", &self.email)
            .finish()
    }
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL (`memory` or a `sqlite:` URL).
    pub database_url: String,
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub access_token_minutes: u64,
    /// Refresh token lifetime in hours.
    pub refresh_token_hours: u64,
    /// Whether self-registration may pick its own role.
    pub allow_self_assigned_role: bool,
    /// Administrator to create at startup.
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Log level.
    pub log_level: String,
    /// Log format.
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"[redacted]")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_hours", &self.refresh_token_hours)
            .field("allow_self_assigned_role", &self.allow_self_assigned_role)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_var<T>(name: &str, value: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}

fn parse_lifetime(name: &str, value: Option<String>, default: u64, max: u64) -> anyhow::Result<u64> {
    let lifetime = parse_var(name, value, default)?;
    if !(1..=max).contains(&lifetime) {
        bail!("{name}={lifetime} is out of range, expected 1..={max}");
    }
    Ok(lifetime)
}

fn parse_bool(name: &str, value: Option<String>) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" || v == "1" || v == "yes" => Ok(true),
        Some(v) if v == "false" || v == "0" || v == "no" || v.is_empty() => Ok(false),
        Some(v) => bail!("{name}={v:?} is not a boolean"),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns the value of a
    /// variable or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("EVENTS_JWT_SECRET").context("EVENTS_JWT_SECRET is required")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!("EVENTS_JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes");
        }

        let bootstrap_admin = match (
            lookup("EVENTS_BOOTSTRAP_ADMIN_USERNAME"),
            lookup("EVENTS_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                username,
                password,
                email: lookup("EVENTS_BOOTSTRAP_ADMIN_EMAIL").unwrap_or_default(),
            }),
            (None, None) => None,
            _ => bail!(
                "EVENTS_BOOTSTRAP_ADMIN_USERNAME and EVENTS_BOOTSTRAP_ADMIN_PASSWORD must be set together"
            ),
        };

        Ok(Self {
            host: lookup("EVENTS_SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var("EVENTS_SERVER_PORT", lookup("EVENTS_SERVER_PORT"), 8000)?,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "memory".to_string()),
            jwt_secret,
            access_token_minutes: parse_lifetime(
                "EVENTS_ACCESS_TOKEN_MINUTES",
                lookup("EVENTS_ACCESS_TOKEN_MINUTES"),
                auth::DEFAULT_ACCESS_TOKEN_MINUTES,
                auth::MAX_ACCESS_TOKEN_MINUTES,
            )?,
            refresh_token_hours: parse_lifetime(
                "EVENTS_REFRESH_TOKEN_HOURS",
                lookup("EVENTS_REFRESH_TOKEN_HOURS"),
                auth::DEFAULT_REFRESH_TOKEN_HOURS,
                auth::MAX_REFRESH_TOKEN_HOURS,
            )?,
            allow_self_assigned_role: parse_bool(
                "EVENTS_ALLOW_SELF_ASSIGNED_ROLE",
                lookup("EVENTS_ALLOW_SELF_ASSIGNED_ROLE"),
            )?,
            bootstrap_admin,
            log_level: lookup("EVENTS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parse_var("EVENTS_LOG_FORMAT", lookup("EVENTS_LOG_FORMAT"), LogFormat::Text)?,
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the store selected by `database_url`.
    pub fn store_backend(&self) -> StoreBackend {
        let url = self.database_url.trim();
        if url.is_empty() || url.eq_ignore_ascii_case("memory") {
            StoreBackend::Memory
        } else {
            StoreBackend::Sqlite(url.to_string())
        }
    }
}
