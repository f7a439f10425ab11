use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::{ExposeSecret, SecretString};
use time::Duration;

use crate::{application::jwt::TokenSettings, infra::error::InfraError};

/// Shortest accepted HS256 signing key, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Clock skew tolerated when checking access-token expiry. Zero by default.
    pub jwt_leeway_secs: u64,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let jwt_issuer: String = get_env_default("JWT_ISSUER", "CoreAPI".to_string());
        let jwt_audience: String = get_env_default("JWT_AUDIENCE", "CoreAPIUsers".to_string());

        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 900);
        let refresh_token_ttl_days: i64 = get_env_default("REFRESH_TOKEN_TTL_DAYS", 7);
        let jwt_leeway_secs: u64 = get_env_default("JWT_LEEWAY_SECS", 0);

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());

        let database_url: String = get_env("DATABASE_URL");
        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);
        let db_acquire_timeout_secs: u64 = get_env_default("DB_ACQUIRE_TIMEOUT_SECS", 5);
        let request_timeout_secs: u64 = get_env_default("REQUEST_TIMEOUT_SECS", 15);

        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            refresh_token_ttl: Duration::days(refresh_token_ttl_days),
            jwt_leeway_secs,
            cors_origin,
            bind_addr,
            database_url,
            db_max_connections,
            db_acquire_timeout_secs,
            request_timeout_secs,
        }
    }

    /// Startup checks on the token configuration. A failure here must stop the process.
    pub fn validate(&self) -> Result<(), InfraError> {
        if self.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(InfraError::ConfigInvalid {
                var: "JWT_SECRET",
                reason: "must be at least 32 bytes",
            });
        }
        if self.access_token_ttl <= Duration::ZERO {
            return Err(InfraError::ConfigInvalid {
                var: "ACCESS_TOKEN_TTL_SECS",
                reason: "must be positive",
            });
        }
        if self.refresh_token_ttl <= self.access_token_ttl {
            return Err(InfraError::ConfigInvalid {
                var: "REFRESH_TOKEN_TTL_DAYS",
                reason: "refresh lifetime must exceed the access token lifetime",
            });
        }
        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
            leeway_secs: self.jwt_leeway_secs,
        }
    }
}
