//! In-memory implementations of the auth store ports.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::jwt::hash_refresh_secret,
    domain::entities::{refresh_token::RefreshToken, user::User},
    use_cases::auth::{RefreshTokenRepo, UserRepo},
};

// ============================================================================
// InMemoryRefreshTokenRepo
// ============================================================================

/// In-memory refresh token ledger. Every operation runs under one lock, which
/// gives the same all-or-nothing behavior as the Postgres transactions.
#[derive(Default)]
pub struct InMemoryRefreshTokenRepo {
    pub tokens: Mutex<HashMap<Uuid, RefreshToken>>,
    unavailable: AtomicBool,
}

impl InMemoryRefreshTokenRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, login writes fail with `StoreUnavailable` and change nothing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Revokes the user's active tokens and inserts `replacement` under one lock.
    fn replace_active(&self, user_id: Uuid, replacement: &RefreshToken) -> AppResult<u64> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("ledger unavailable".into()));
        }
        let mut tokens = self.tokens.lock().unwrap();
        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && !token.is_revoked {
                token.is_revoked = true;
                revoked += 1;
            }
        }
        tokens.insert(replacement.id, replacement.clone());
        Ok(revoked)
    }

    pub fn insert(&self, token: RefreshToken) {
        self.tokens.lock().unwrap().insert(token.id, token);
    }

    pub fn tokens_for_user(&self, user_id: Uuid) -> Vec<RefreshToken> {
        let mut tokens: Vec<RefreshToken> = self
            .tokens
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.created_at);
        tokens
    }

    /// Looks a row up by the plaintext secret a client would hold.
    pub fn get_by_secret(&self, secret: &str) -> Option<RefreshToken> {
        let secret_hash = hash_refresh_secret(secret);
        self.tokens
            .lock()
            .unwrap()
            .values()
            .find(|t| t.secret_hash == secret_hash)
            .cloned()
    }
}

#[async_trait]
impl RefreshTokenRepo for InMemoryRefreshTokenRepo {
    async fn find_by_secret_hash(&self, secret_hash: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .values()
            .find(|t| t.secret_hash == secret_hash)
            .cloned())
    }

    async fn revoke(&self, token_id: Uuid) -> AppResult<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(&token_id) {
            Some(token) if !token.is_revoked => {
                token.is_revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rotate(
        &self,
        old_id: Uuid,
        now: NaiveDateTime,
        replacement: &RefreshToken,
    ) -> AppResult<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(&old_id) {
            Some(old) if old.is_usable_at(now) => old.is_revoked = true,
            _ => return Ok(false),
        }
        tokens.insert(replacement.id, replacement.clone());
        Ok(true)
    }
}

// ============================================================================
// InMemoryUserRepo
// ============================================================================

/// In-memory user store. Holds a ledger handle so registration and login
/// write users and tokens together, like the Postgres transactions.
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, User>>,
    refresh_tokens: Arc<InMemoryRefreshTokenRepo>,
}

impl InMemoryUserRepo {
    /// User store that writes registration and login tokens into `refresh_tokens`.
    pub fn with_ledger(refresh_tokens: Arc<InMemoryRefreshTokenRepo>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            refresh_tokens,
        }
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn set_active(&self, user_id: Uuid, is_active: bool) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            user.is_active = is_active;
        }
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn insert_with_refresh_token(&self, user: &User, token: &RefreshToken) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        self.refresh_tokens.insert(token.clone());
        Ok(())
    }

    async fn complete_login(
        &self,
        user_id: Uuid,
        at: NaiveDateTime,
        replacement: &RefreshToken,
    ) -> AppResult<u64> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&user_id) else {
            return Err(AppError::InvalidCredentials);
        };
        // Ledger first: a failure there must leave the user untouched
        let revoked = self.refresh_tokens.replace_active(user_id, replacement)?;
        user.last_login_at = Some(at);
        user.updated_at = at;
        Ok(revoked)
    }
}
