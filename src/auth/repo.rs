use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::auth::{
    repo_types::{NewUser, User, UserRow},
    tokens::Token,
};

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.bio, u.first_name, \
     u.last_name, u.profile_picture, u.last_login, u.created_at, u.updated_at";

/// Returned by `create_user` when the username or email is already taken.
#[derive(Debug, Error)]
#[error("username or email already taken")]
pub struct DuplicateUser;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Persists profile fields. `None` when the user no longer exists.
    async fn update_user(&self, user: &User) -> anyhow::Result<Option<User>>;
    async fn record_login(&self, user_id: i64) -> anyhow::Result<()>;
    /// Looks up the owner of a live token by digest and scope.
    async fn get_user_for_token(
        &self,
        digest: &[u8],
        scope: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn create_token(&self, token: &Token) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.{column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users AS u (username, email, password_hash, bio, first_name, last_name, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING u.id, u.username, u.email, u.password_hash, u.bio, u.first_name,
                      u.last_name, u.profile_picture, u.last_login, u.created_at, u.updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password.hash())
        .bind(&user.bio)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => anyhow::Error::new(DuplicateUser),
            other => other.into(),
        })?;
        Ok(row.into())
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        self.find_one("username", username).await
    }

    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn update_user(&self, user: &User) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users AS u
            SET bio = $1, first_name = $2, last_name = $3, profile_picture = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE u.id = $5
            RETURNING u.id, u.username, u.email, u.password_hash, u.bio, u.first_name,
                      u.last_name, u.profile_picture, u.last_login, u.created_at, u.updated_at
            "#,
        )
        .bind(&user.bio)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture)
        .bind(user.id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn record_login(&self, user_id: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn get_user_for_token(
        &self,
        digest: &[u8],
        scope: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             INNER JOIN tokens t ON t.user_id = u.id \
             WHERE t.hash = $1 AND t.scope = $2 AND t.expiry > $3"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(digest)
            .bind(scope)
            .bind(now)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl TokenStore for PgUserStore {
    async fn create_token(&self, token: &Token) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.hash)
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(&token.scope)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
