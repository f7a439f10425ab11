use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::refresh_token::RefreshToken,
    use_cases::auth::RefreshTokenRepo,
};

fn row_to_token(row: sqlx::postgres::PgRow) -> RefreshToken {
    RefreshToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        secret_hash: row.get("secret_hash"),
        expires_at: row.get("expires_at"),
        is_revoked: row.get("is_revoked"),
        created_at: row.get("created_at"),
    }
}

pub(super) async fn insert_token(
    tx: &mut Transaction<'_, Postgres>,
    token: &RefreshToken,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, secret_hash, expires_at, is_revoked, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(token.id)
    .bind(token.user_id)
    .bind(&token.secret_hash)
    .bind(token.expires_at)
    .bind(token.is_revoked)
    .bind(token.created_at)
    .execute(&mut **tx)
    .await
    .map_err(AppError::from)?;
    Ok(())
}

/// Revokes every active token of the user inside `tx`. Returns how many were flipped.
pub(super) async fn revoke_all_active(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET is_revoked = TRUE WHERE user_id = $1 AND is_revoked = FALSE",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::from)?;
    Ok(result.rows_affected())
}

#[async_trait]
impl RefreshTokenRepo for PostgresPersistence {
    async fn find_by_secret_hash(&self, secret_hash: &str) -> AppResult<Option<RefreshToken>> {
        let row = sqlx::query(
            "SELECT id, user_id, secret_hash, expires_at, is_revoked, created_at FROM refresh_tokens WHERE secret_hash = $1",
        )
        .bind(secret_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_token))
    }

    async fn revoke(&self, token_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET is_revoked = TRUE WHERE id = $1 AND is_revoked = FALSE",
        )
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn rotate(
        &self,
        old_id: Uuid,
        now: NaiveDateTime,
        replacement: &RefreshToken,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Row lock makes a concurrent rotation of the same token wait, then re-check
        // the predicate and update nothing.
        let flipped = sqlx::query(
            r#"
            UPDATE refresh_tokens SET is_revoked = TRUE
            WHERE id = $1 AND is_revoked = FALSE AND expires_at > $2
            "#,
        )
        .bind(old_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?
        .rows_affected();

        if flipped == 0 {
            tx.rollback().await.map_err(AppError::from)?;
            return Ok(false);
        }

        insert_token(&mut tx, replacement).await?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(true)
    }
}
