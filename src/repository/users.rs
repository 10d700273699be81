//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::is_unique_violation;
use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, Role, User, UserSummary},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    /// Get user by email (the unique user key)
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user; `AlreadyExists` if the email is taken
    async fn create(&self, user: &NewUser) -> AppResult<()>;

    /// Overwrite the password digest. Returns false when no such user.
    async fn update_password(&self, email: &str, password_hash: &str) -> AppResult<bool>;

    /// Change the role. Returns false when no such user.
    async fn update_role(&self, email: &str, role: Role) -> AppResult<bool>;

    async fn list(&self) -> AppResult<Vec<UserSummary>>;

    /// Round-trip to the store, for readiness checks
    async fn ping(&self) -> AppResult<()>;
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersStore for UsersRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT email_id, name, password, role FROM users WHERE email_id = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &NewUser) -> AppResult<()> {
        sqlx::query("INSERT INTO users (email_id, name, password, role) VALUES ($1, $2, $3, $4)")
            .bind(&user.email_id)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AlreadyExists("User already exists. Please login to proceed.".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE email_id = $2")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_role(&self, email: &str, role: Role) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE email_id = $2")
            .bind(role)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT email_id, name, role FROM users ORDER BY name, email_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
