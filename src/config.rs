//! Process-wide configuration.
//!
//! Everything here is read once at startup and then handed, immutable, to the
//! components that need it (`Database`, `TokenIssuer`). Nothing reaches back into
//! the environment after `Config::from_env` returns.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use sqlx::postgres::PgConnectOptions;

/// Errors raised while building a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Connection settings for PostgreSQL plus pool sizing.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// Connections the pool keeps around.
    pub pool_size: u32,
    /// Extra connections the pool may open under load.
    pub max_overflow: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }

    /// Upper bound on open connections.
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }
}

/// Token signing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_ttl: chrono::Duration,
}

// Keeps the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let database = DatabaseConfig {
            host: required("DB_LB_HOST")?,
            port: parse_or(&lookup, "DB_LB_PORT", 5432)?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            name: required("POSTGRES_DB")?,
            pool_size: parse_or(&lookup, "DB_POOL_SIZE", 5)?,
            max_overflow: parse_or(&lookup, "DB_MAX_OVERFLOW", 10)?,
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECONDS",
                30,
            )?),
        };

        let secret_key = required("SECRET_KEY")?;
        if secret_key.is_empty() {
            return Err(ConfigError::Missing("SECRET_KEY"));
        }
        let algorithm = parse_algorithm(lookup("ALGORITHM"))?;
        let ttl_minutes: i64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: ttl_minutes.to_string(),
            });
        }

        Ok(Self {
            database,
            auth: AuthConfig {
                secret_key,
                algorithm,
                access_token_ttl: chrono::Duration::minutes(ttl_minutes),
            },
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

// The signing key is a shared secret, so only the HMAC family makes sense.
fn parse_algorithm(raw: Option<String>) -> Result<Algorithm, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Algorithm::HS256);
    };
    match Algorithm::from_str(raw.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::Invalid {
            key: "ALGORITHM",
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DB_LB_HOST", "db.internal"),
            ("DB_USER", "tasks"),
            ("DB_PASSWORD", "s3cret"),
            ("POSTGRES_DB", "tasks"),
            ("SECRET_KEY", "signing-key"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_config_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.max_connections(), 15);
        assert_eq!(config.auth.algorithm, Algorithm::HS256);
        assert_eq!(config.auth.access_token_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let mut vars = base_env();
        vars.insert("DB_LB_PORT", "6432");
        vars.insert("ALGORITHM", "HS512");
        vars.insert("ACCESS_TOKEN_EXPIRE_MINUTES", "5");
        vars.insert("SERVER_PORT", "3000");
        vars.insert("SERVER_HOST", "0.0.0.0");

        let config = load(&vars).unwrap();

        assert_eq!(config.database.port, 6432);
        assert_eq!(config.auth.algorithm, Algorithm::HS512);
        assert_eq!(config.auth.access_token_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
    }

    #[test]
    fn test_config_missing_secret() {
        let mut vars = base_env();
        vars.remove("SECRET_KEY");

        match load(&vars) {
            Err(ConfigError::Missing(key)) => assert_eq!(key, "SECRET_KEY"),
            other => panic!("expected missing SECRET_KEY, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_asymmetric_algorithm() {
        let mut vars = base_env();
        vars.insert("ALGORITHM", "RS256");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { key: "ALGORITHM", .. })
        ));
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let mut vars = base_env();
        vars.insert("DB_LB_PORT", "not-a-port");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { key: "DB_LB_PORT", .. })
        ));

        let mut vars = base_env();
        vars.insert("ACCESS_TOKEN_EXPIRE_MINUTES", "0");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_auth_config_debug_hides_secret() {
        let config = load(&base_env()).unwrap();
        let printed = format!("{:?}", config.auth);
        assert!(!printed.contains("signing-key"));
    }
}
