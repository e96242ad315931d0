use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{Book, BookWithAuthorRow, NewBook};
use crate::db::{PgStore, StoreError};

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, new: NewBook) -> Result<Book, StoreError>;

    /// Newest first, with owner username and avatar.
    async fn page(&self, limit: i64, offset: i64) -> Result<Vec<BookWithAuthorRow>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// All of a user's books, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Book>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, StoreError>;

    /// Returns false if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
impl BookStore for PgStore {
    async fn insert(&self, new: NewBook) -> Result<Book, StoreError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, user_id, title, caption, rating, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, caption, rating, image, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.caption)
        .bind(new.rating)
        .bind(&new.image)
        .fetch_one(&self.db)
        .await?;
        Ok(book)
    }

    async fn page(&self, limit: i64, offset: i64) -> Result<Vec<BookWithAuthorRow>, StoreError> {
        let rows = sqlx::query_as::<_, BookWithAuthorRow>(
            r#"
            SELECT b.id, b.user_id, b.title, b.caption, b.rating, b.image, b.created_at,
                   u.username, u.profile_image
            FROM books b
            JOIN users u ON u.id = b.user_id
            ORDER BY b.created_at DESC, b.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, user_id, title, caption, rating, image, created_at
            FROM books
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, user_id, title, caption, rating, image, created_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(book)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
