use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub statement_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.url {
            Some(url) => PgConnectOptions::from_str(url),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.username)
                .password(&self.password)
                .database(&self.name)),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

/// Password policy and Argon2 cost knobs. `None` keeps the argon2 crate default.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            memory_kib: None,
            iterations: None,
            parallelism: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests never touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let port: u16 = parse(required("APP_PORT")?, "APP_PORT")?;

        let url = var("DATABASE_URL");
        let db_part = |key: &'static str| -> Result<String, ConfigError> {
            if url.is_some() {
                Ok(var(key).unwrap_or_default())
            } else {
                required(key)
            }
        };
        let database = DatabaseConfig {
            host: var("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(var("DB_PORT"), "DB_PORT", 5432)?,
            username: db_part("DB_USERNAME")?,
            password: db_part("DB_PASSWORD")?,
            name: db_part("DB_NAME")?,
            max_connections: parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_or(
                var("DB_ACQUIRE_TIMEOUT_SECS"),
                "DB_ACQUIRE_TIMEOUT_SECS",
                5,
            )?,
            statement_timeout_secs: parse_or(
                var("DB_STATEMENT_TIMEOUT_SECS"),
                "DB_STATEMENT_TIMEOUT_SECS",
                5,
            )?,
            url,
        };

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "account-service".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "account-service-users".into()),
            ttl_minutes: parse_or(var("JWT_TTL_MINUTES"), "JWT_TTL_MINUTES", 60)?,
        };

        let password = PasswordConfig {
            min_length: parse_or(var("PASSWORD_MIN_LENGTH"), "PASSWORD_MIN_LENGTH", 8)?,
            memory_kib: var("ARGON2_MEMORY_KIB")
                .map(|v| parse(v, "ARGON2_MEMORY_KIB"))
                .transpose()?,
            iterations: var("ARGON2_ITERATIONS")
                .map(|v| parse(v, "ARGON2_ITERATIONS"))
                .transpose()?,
            parallelism: var("ARGON2_PARALLELISM")
                .map(|v| parse(v, "ARGON2_PARALLELISM"))
                .transpose()?,
        };

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database,
            jwt,
            password,
        })
    }
}

fn parse<T>(raw: String, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|v| parse(v, key)).transpose().map(|v| v.unwrap_or(default))
}
