/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, JWT_SECRET, token lifetime, users など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::UserSeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// No `Debug`: holds the signing secret and seed passwords.
#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // HMAC secret for access tokens. `None` => random per process (development only).
    pub jwt_secret: Option<String>,
    // Token lifetime (seconds)
    pub access_token_ttl_seconds: u64,

    pub users: Vec<UserSeed>,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source (the process environment in `from_env`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = lookup("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let jwt_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());
        if jwt_secret.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let access_token_ttl_seconds = positive(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 3600)?; // 1 hour

        let users = parse_users(&lookup("AUTH_USERS").unwrap_or_default())?;

        let request_timeout_seconds = positive(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?;
        let request_body_limit_bytes =
            positive(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        Ok(Self {
            addr,
            app_env,
            jwt_secret,
            access_token_ttl_seconds,
            users,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

// Unset => default. Set but unparseable or zero => invalid.
fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .ok()
            .filter(|n| *n > T::default())
            .ok_or(ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// `alice:secret:USER;bob:pw:USER,ADMIN`
///
/// The password is everything between the first and the last `:`, so it may itself contain `:`.
/// A trailing `:` with nothing after it means no roles.
pub fn parse_users(raw: &str) -> Result<Vec<UserSeed>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (username, rest) = entry
                .split_once(':')
                .ok_or(ConfigError::Invalid("AUTH_USERS"))?;
            let (password, roles) = rest
                .rsplit_once(':')
                .ok_or(ConfigError::Invalid("AUTH_USERS"))?;

            let username = username.trim();
            if username.is_empty() || password.is_empty() {
                return Err(ConfigError::Invalid("AUTH_USERS"));
            }

            let roles = roles
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();

            Ok(UserSeed {
                username: username.to_string(),
                password: password.to_string(),
                roles,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_users_with_roles() {
        let users = parse_users("alice:wonderland:USER; bob:b:ob:USER,ADMIN ;carol:pw:").unwrap();

        assert_eq!(users.len(), 3);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].password, "wonderland");
        assert_eq!(users[0].roles, vec!["USER"]);

        assert_eq!(users[1].password, "b:ob");
        assert_eq!(users[1].roles, vec!["USER", "ADMIN"]);

        assert!(users[2].roles.is_empty());
    }

    #[test]
    fn empty_user_list_is_allowed() {
        assert!(parse_users("").unwrap().is_empty());
    }

    #[test]
    fn rejects_entries_without_password() {
        assert_eq!(
            parse_users("alice").unwrap_err(),
            ConfigError::Invalid("AUTH_USERS")
        );
        assert_eq!(
            parse_users("alice:USER").unwrap_err(),
            ConfigError::Invalid("AUTH_USERS")
        );
    }

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_apply_in_development() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.addr.port(), 3000);
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.access_token_ttl_seconds, 3600);
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.request_body_limit_bytes, 1024 * 1024);
        assert!(config.users.is_empty());
    }

    #[test]
    fn production_requires_jwt_secret() {
        let err = Config::from_lookup(lookup(&[("APP_ENV", "production")])).err();
        assert_eq!(err, Some(ConfigError::Missing("JWT_SECRET")));

        let err = Config::from_lookup(lookup(&[("APP_ENV", "prod"), ("JWT_SECRET", "")])).err();
        assert_eq!(err, Some(ConfigError::Missing("JWT_SECRET")));

        let config = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "prod-secret-prod-secret-prod-secret"),
        ]))
        .unwrap();
        assert!(config.app_env.is_production());
        assert!(config.jwt_secret.is_some());
    }

    #[test]
    fn token_lifetime_must_be_positive() {
        for value in ["0", "-5", "soon"] {
            let err = Config::from_lookup(lookup(&[("ACCESS_TOKEN_TTL_SECONDS", value)])).err();
            assert_eq!(
                err,
                Some(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS")),
                "{value:?}"
            );
        }

        let config = Config::from_lookup(lookup(&[("ACCESS_TOKEN_TTL_SECONDS", "900")])).unwrap();
        assert_eq!(config.access_token_ttl_seconds, 900);
    }

    #[test]
    fn http_limits_reject_zero_and_garbage() {
        for key in ["REQUEST_TIMEOUT_SECONDS", "REQUEST_BODY_LIMIT_BYTES"] {
            for value in ["0", "lots"] {
                let err = Config::from_lookup(lookup(&[(key, value)])).err();
                assert_eq!(err, Some(ConfigError::Invalid(key)), "{key}={value:?}");
            }
        }

        let config = Config::from_lookup(lookup(&[
            ("REQUEST_TIMEOUT_SECONDS", "5"),
            ("REQUEST_BODY_LIMIT_BYTES", "2048"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout_seconds, 5);
        assert_eq!(config.request_body_limit_bytes, 2048);
    }

    #[test]
    fn malformed_users_fail_startup() {
        let err = Config::from_lookup(lookup(&[("AUTH_USERS", "alice")])).err();
        assert_eq!(err, Some(ConfigError::Invalid("AUTH_USERS")));
    }

    #[test]
    fn app_env_parsing() {
        assert!(AppEnv::parse("PROD").is_production());
        assert!(AppEnv::parse("production").is_production());
        assert!(!AppEnv::parse("staging").is_production());
    }
}
