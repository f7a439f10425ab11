use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, SubsecRound, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        jwt::{AccessClaims, TokenSigner, hash_refresh_secret},
        password::CredentialHasher,
        validators::{
            MAX_COMPANY_LEN, MAX_NAME_LEN, is_valid_email, normalize_email, require_password,
            require_text,
        },
    },
    domain::entities::{
        refresh_token::RefreshToken,
        user::{DEFAULT_ROLE, User},
    },
};

// ============================================================================
// Store Ports
// ============================================================================

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Exact match on the already-normalized email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Inserts the user and its first refresh token together.
    /// Fails with `DuplicateEmail` if the email is taken.
    async fn insert_with_refresh_token(&self, user: &User, token: &RefreshToken) -> AppResult<()>;
    /// Sets `last_login_at`, revokes every active token of the user and inserts
    /// `replacement`, as one unit. Returns the number of tokens revoked.
    async fn complete_login(
        &self,
        user_id: Uuid,
        at: NaiveDateTime,
        replacement: &RefreshToken,
    ) -> AppResult<u64>;
}

#[async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    async fn find_by_secret_hash(&self, secret_hash: &str) -> AppResult<Option<RefreshToken>>;
    /// Flips `is_revoked` only if it is still false. Returns whether this call flipped it.
    async fn revoke(&self, token_id: Uuid) -> AppResult<bool>;
    /// Conditionally revokes `old_id` (not revoked, not expired at `now`) and inserts
    /// `replacement` in the same unit. Returns false, with nothing written, when the
    /// old token was no longer usable.
    async fn rotate(
        &self,
        old_id: Uuid,
        now: NaiveDateTime,
        replacement: &RefreshToken,
    ) -> AppResult<bool>;
}

// ============================================================================
// Inputs and Outputs
// ============================================================================

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub company: String,
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub last_login_at: Option<NaiveDateTime>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            company: user.company.clone(),
            role: user.role.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Result of register, login and refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub access_token_expires_at: NaiveDateTime,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Identity carried by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentIdentity {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub company: String,
}

/// Pure read of already-verified claims; no store access.
pub fn current_identity(claims: &AccessClaims) -> CurrentIdentity {
    CurrentIdentity {
        user_id: claims.sub.clone(),
        email: claims.email.clone(),
        name: claims.name.clone(),
        role: claims.role.clone(),
        company: claims.company.clone(),
    }
}

// ============================================================================
// Auth Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AuthUseCases {
    users: Arc<dyn UserRepo>,
    refresh_tokens: Arc<dyn RefreshTokenRepo>,
    signer: Arc<TokenSigner>,
    hasher: Arc<CredentialHasher>,
}

impl AuthUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        refresh_tokens: Arc<dyn RefreshTokenRepo>,
        signer: Arc<TokenSigner>,
        hasher: Arc<CredentialHasher>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            signer,
            hasher,
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthSession> {
        require_text("firstName", &input.first_name, MAX_NAME_LEN)?;
        require_text("lastName", &input.last_name, MAX_NAME_LEN)?;
        if !is_valid_email(&input.email) {
            return Err(AppError::InvalidInput("Invalid email format".into()));
        }
        require_password(&input.password)?;
        require_text("company", &input.company, MAX_COMPANY_LEN)?;

        let email = normalize_email(&input.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let now = now_utc();
        let user = User {
            id: Uuid::new_v4(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email,
            password_hash: self.hash_password(&input.password).await?,
            company: input.company.trim().to_string(),
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let (secret, token) = self.mint_refresh_token(user.id, now);
        // A concurrent registration of the same email surfaces here as DuplicateEmail
        self.users.insert_with_refresh_token(&user, &token).await?;

        tracing::info!(user_id = %user.id, token_id = %token.id, "User registered");
        self.session_for(&user, secret)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "email and password are required".into(),
            ));
        }

        let email = normalize_email(email);
        // Unknown, inactive and wrong-password all collapse to the same error
        let Some(mut user) = self.users.find_by_email(&email).await? else {
            return Err(AppError::InvalidCredentials);
        };
        if !user.is_active || !self.verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let now = now_utc();
        let (secret, token) = self.mint_refresh_token(user.id, now);
        let revoked = self.users.complete_login(user.id, now, &token).await?;
        user.last_login_at = Some(now);

        tracing::info!(
            user_id = %user.id,
            token_id = %token.id,
            revoked_tokens = revoked,
            "User logged in"
        );
        self.session_for(&user, secret)
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, presented_secret: &str) -> AppResult<AuthSession> {
        if presented_secret.is_empty() {
            return Err(AppError::InvalidRefreshToken);
        }

        let now = now_utc();
        let secret_hash = hash_refresh_secret(presented_secret);
        let Some(current) = self.refresh_tokens.find_by_secret_hash(&secret_hash).await? else {
            return Err(AppError::InvalidRefreshToken);
        };
        if current.is_revoked {
            // A rotated secret showing up again means it was copied somewhere
            tracing::warn!(
                token_id = %current.id,
                user_id = %current.user_id,
                "Revoked refresh token presented again"
            );
            return Err(AppError::InvalidRefreshToken);
        }
        if current.is_expired_at(now) {
            return Err(AppError::InvalidRefreshToken);
        }

        let user = match self.users.find_by_id(current.user_id).await? {
            Some(user) if user.is_active => user,
            _ => return Err(AppError::InvalidRefreshToken),
        };

        let (secret, replacement) = self.mint_refresh_token(user.id, now);
        if !self
            .refresh_tokens
            .rotate(current.id, now, &replacement)
            .await?
        {
            // Lost the race against another refresh (or a logout) on the same secret
            tracing::warn!(token_id = %current.id, "Refresh token rotation lost the race");
            return Err(AppError::InvalidRefreshToken);
        }

        tracing::info!(
            user_id = %user.id,
            old_token_id = %current.id,
            token_id = %replacement.id,
            "Refresh token rotated"
        );
        self.session_for(&user, secret)
    }

    /// Always succeeds for unknown or already-revoked secrets.
    #[instrument(skip_all)]
    pub async fn logout(&self, presented_secret: &str) -> AppResult<()> {
        if presented_secret.is_empty() {
            return Ok(());
        }

        let secret_hash = hash_refresh_secret(presented_secret);
        if let Some(token) = self.refresh_tokens.find_by_secret_hash(&secret_hash).await? {
            let flipped = self.refresh_tokens.revoke(token.id).await?;
            tracing::info!(token_id = %token.id, revoked = flipped, "Logout");
        }
        Ok(())
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<AccessClaims> {
        self.signer.verify_access_token(token)
    }

    // Argon2 is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: &str) -> AppResult<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, digest: &str) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
    }

    fn mint_refresh_token(&self, user_id: Uuid, now: NaiveDateTime) -> (String, RefreshToken) {
        let secret = self.signer.issue_refresh_secret();
        let token = RefreshToken::issue(
            user_id,
            hash_refresh_secret(&secret),
            now,
            self.signer.refresh_token_lifetime(),
        );
        (secret, token)
    }

    fn session_for(&self, user: &User, refresh_secret: String) -> AppResult<AuthSession> {
        let access = self.signer.issue_access_token(user)?;
        Ok(AuthSession {
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token: refresh_secret,
            user: UserProfile::from(user),
        })
    }
}

/// Microsecond precision so timestamps survive a Postgres round-trip unchanged.
fn now_utc() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}
