use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::{refresh_token::RefreshToken, user::User},
    use_cases::auth::UserRepo,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, company, role, \
     is_active, created_at, updated_at, last_login_at";

fn row_to_user(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        company: row.get("company"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        last_login_at: row.get("last_login_at"),
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_user))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_user))
    }

    async fn insert_with_refresh_token(&self, user: &User, token: &RefreshToken) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, password_hash, company, role,
                               is_active, created_at, updated_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.company)
        .bind(&user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        super::refresh_token::insert_token(&mut tx, token).await?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(())
    }

    async fn complete_login(
        &self,
        user_id: Uuid,
        at: NaiveDateTime,
        replacement: &RefreshToken,
    ) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let updated = sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?
            .rows_affected();
        // Deleted between lookup and write
        if updated == 0 {
            tx.rollback().await.map_err(AppError::from)?;
            return Err(AppError::InvalidCredentials);
        }

        let revoked = super::refresh_token::revoke_all_active(&mut tx, user_id).await?;
        super::refresh_token::insert_token(&mut tx, replacement).await?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(revoked)
    }
}
