use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserProfile};
use crate::db::{PgStore, StoreError};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Profile lookup for token resolution; never loads the password hash.
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError>;

    async fn email_or_username_taken(&self, email: &str, username: &str)
        -> Result<bool, StoreError>;

    /// Fails with `StoreError::Duplicate` when email or username is taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, profile_image, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, email, username, profile_image, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn email_or_username_taken(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, StoreError> {
        let taken: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)"#,
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, username, password_hash, profile_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, password_hash, profile_image, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&new.profile_image)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}
