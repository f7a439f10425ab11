use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

/// A ledger row. `secret_hash` is the SHA-256 of the secret handed to the client;
/// the plaintext secret is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub secret_hash: String,
    pub expires_at: NaiveDateTime,
    pub is_revoked: bool,
    pub created_at: NaiveDateTime,
}

impl RefreshToken {
    /// New, non-revoked token expiring exactly `lifetime` after `issued_at`.
    pub fn issue(
        user_id: Uuid,
        secret_hash: String,
        issued_at: NaiveDateTime,
        lifetime: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            secret_hash,
            expires_at: issued_at + lifetime,
            is_revoked: false,
            created_at: issued_at,
        }
    }

    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }

    pub fn is_usable_at(&self, now: NaiveDateTime) -> bool {
        !self.is_revoked && !self.is_expired_at(now)
    }
}
