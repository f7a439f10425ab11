use base64::Engine;
use chrono::{DateTime, NaiveDateTime};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::user::User;

/// Size of a refresh secret before encoding (256 bits).
const REFRESH_SECRET_BYTES: usize = 32;

// ============================================================================
// Access Token Claims
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user id
    pub email: String,
    pub name: String, // "first last"
    pub role: String,
    pub company: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub expires_at: NaiveDateTime,
}

#[derive(Clone)]
pub struct TokenSettings {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

// ============================================================================
// Token Signer
// ============================================================================

/// Signs and verifies access tokens (HS256) and mints opaque refresh secrets.
///
/// Verification needs only the signing key: no store access.
#[derive(Clone)]
pub struct TokenSigner {
    settings: TokenSettings,
}

impl TokenSigner {
    pub fn new(settings: TokenSettings) -> Self {
        Self { settings }
    }

    /// Lifetime added to the issue instant to get a refresh token's `expires_at`.
    pub fn refresh_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.settings.refresh_token_ttl.whole_seconds())
    }

    pub fn issue_access_token(&self, user: &User) -> AppResult<IssuedAccessToken> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let exp = now + self.settings.access_token_ttl.whole_seconds();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name(),
            role: user.role.clone(),
            company: user.company.clone(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now,
            exp,
        };
        let header = Header::new(Algorithm::HS256);
        let token = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.settings.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AppError::Internal(format!("Access token expiry out of range: {}", exp)))?
            .naive_utc();

        Ok(IssuedAccessToken { token, expires_at })
    }

    /// Checks signature, issuer, audience and expiry. Every failure is `Unauthenticated`.
    ///
    /// A token is expired from its `exp` second onward (plus leeway), the same
    /// boundary the refresh ledger uses for `expires_at`.
    pub fn verify_access_token(&self, token: &str) -> AppResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.settings.issuer.as_str()]);
        validation.set_audience(&[self.settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.settings.leeway_secs;

        let claims = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.settings.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AppError::Unauthenticated
        })?;

        // jsonwebtoken still accepts the exact `exp` second
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let leeway = i64::try_from(self.settings.leeway_secs).unwrap_or(i64::MAX);
        if claims.exp <= now.saturating_sub(leeway) {
            tracing::debug!(exp = claims.exp, "Access token rejected at expiry boundary");
            return Err(AppError::Unauthenticated);
        }

        Ok(claims)
    }

    /// Fresh random refresh secret, unrelated to any access token.
    pub fn issue_refresh_secret(&self) -> String {
        use rand::RngCore;
        let mut bytes = [0u8; REFRESH_SECRET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// Ledger lookup key for a refresh secret.
pub fn hash_refresh_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    let out = hasher.finalize();
    hex::encode(out)
}
