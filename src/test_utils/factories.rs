//! Test data factories.
//!
//! Each factory returns a complete, valid object. Use the closure parameter
//! to override specific fields.

use std::sync::Arc;

use chrono::NaiveDateTime;
use secrecy::SecretString;
use time::Duration;
use uuid::Uuid;

use crate::{
    application::{
        jwt::{TokenSettings, TokenSigner},
        password::CredentialHasher,
    },
    domain::entities::user::{DEFAULT_ROLE, User},
    infra::config::AppConfig,
    use_cases::auth::{AuthUseCases, RefreshTokenRepo, UserRepo},
};

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret-0123";

/// Fixed timestamp for deterministic fixtures.
pub fn test_datetime() -> NaiveDateTime {
    chrono::DateTime::from_timestamp(1_735_689_600, 0)
        .unwrap()
        .naive_utc()
}

/// Create a test user with sensible defaults. The password hash is a placeholder
/// that never verifies; set one with `test_hasher()` when login matters.
pub fn create_test_user(overrides: impl FnOnce(&mut User)) -> User {
    let mut user = User {
        id: Uuid::new_v4(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: "test@example.com".to_string(),
        password_hash: "not-a-real-hash".to_string(),
        company: "Example Corp".to_string(),
        role: DEFAULT_ROLE.to_string(),
        is_active: true,
        created_at: test_datetime(),
        updated_at: test_datetime(),
        last_login_at: None,
    };
    overrides(&mut user);
    user
}

pub fn test_token_settings() -> TokenSettings {
    TokenSettings {
        secret: SecretString::new(TEST_JWT_SECRET.into()),
        issuer: "test-issuer".to_string(),
        audience: "test-audience".to_string(),
        access_token_ttl: Duration::minutes(15),
        refresh_token_ttl: Duration::days(7),
        leeway_secs: 0,
    }
}

pub fn test_config() -> AppConfig {
    let settings = test_token_settings();
    AppConfig {
        jwt_secret: settings.secret,
        jwt_issuer: settings.issuer,
        jwt_audience: settings.audience,
        access_token_ttl: settings.access_token_ttl,
        refresh_token_ttl: settings.refresh_token_ttl,
        jwt_leeway_secs: settings.leeway_secs,
        cors_origin: "http://localhost:3000".parse().unwrap(),
        bind_addr: "127.0.0.1:3001".parse().unwrap(),
        database_url: "postgres://localhost/core_api_test".to_string(),
        db_max_connections: 1,
        db_acquire_timeout_secs: 1,
        request_timeout_secs: 15,
    }
}

/// Argon2id with minimal costs so tests stay fast.
pub fn test_hasher() -> CredentialHasher {
    CredentialHasher::with_params(8, 1, 1).unwrap()
}

pub fn test_auth_use_cases(
    users: Arc<dyn UserRepo>,
    refresh_tokens: Arc<dyn RefreshTokenRepo>,
) -> AuthUseCases {
    AuthUseCases::new(
        users,
        refresh_tokens,
        Arc::new(TokenSigner::new(test_token_settings())),
        Arc::new(test_hasher()),
    )
}
