//! In-process stores and image host. Back `AppState::fake()` and local runs
//! without `DATABASE_URL`; contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User, UserProfile},
        services::default_profile_image,
    },
    books::{
        repo::BookStore,
        repo_types::{Book, BookWithAuthorRow, NewBook},
    },
    db::StoreError,
    storage::ImageHost,
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    // insertion order; later entries are newer
    books: RwLock<Vec<Book>>,
}

impl MemoryStore {
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn book_count(&self) -> usize {
        self.books.read().await.len()
    }

    /// Inserts a user with an unusable password hash and returns its id.
    pub async fn seed_user(&self, username: &str) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", username),
            username: username.to_string(),
            password_hash: String::new(),
            profile_image: default_profile_image(username),
            created_at: OffsetDateTime::now_utc(),
        };
        let id = user.id;
        self.users.write().await.push(user);
        id
    }

    /// Books newest first; ties keep the later insertion first.
    fn newest_first<'a>(books: impl DoubleEndedIterator<Item = &'a Book>) -> Vec<Book> {
        let mut out: Vec<Book> = books.rev().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned().map(Into::into))
    }

    async fn email_or_username_taken(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .any(|u| u.email == email || u.username == username))
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.email == new.email || u.username == new.username)
        {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            username: new.username,
            password_hash: new.password_hash,
            profile_image: new.profile_image,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, new: NewBook) -> Result<Book, StoreError> {
        let book = Book {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            caption: new.caption,
            rating: new.rating,
            image: new.image,
            created_at: OffsetDateTime::now_utc(),
        };
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn page(&self, limit: i64, offset: i64) -> Result<Vec<BookWithAuthorRow>, StoreError> {
        let books = self.books.read().await;
        let users = self.users.read().await;
        let rows = Self::newest_first(books.iter())
            .into_iter()
            .filter_map(|b| {
                // inner join: books of vanished users drop out
                let owner = users.iter().find(|u| u.id == b.user_id)?;
                Some(BookWithAuthorRow {
                    id: b.id,
                    user_id: b.user_id,
                    title: b.title,
                    caption: b.caption,
                    rating: b.rating,
                    image: b.image,
                    created_at: b.created_at,
                    username: owner.username.clone(),
                    profile_image: owner.profile_image.clone(),
                })
            })
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.books.read().await.len() as i64)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(Self::newest_first(
            books.iter().filter(|b| b.user_id == user_id),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() < before)
    }
}

/// Image host keeping uploads in memory under `<marker>/books/<id>`.
pub struct MemoryImageHost {
    marker: String,
    objects: RwLock<HashMap<String, (String, Bytes)>>,
    destroyed: RwLock<Vec<String>>,
    fail_upload: bool,
    fail_destroy: bool,
}

impl MemoryImageHost {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            objects: RwLock::new(HashMap::new()),
            destroyed: RwLock::new(Vec::new()),
            fail_upload: false,
            fail_destroy: false,
        }
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.fail_destroy = true;
        self
    }

    pub async fn stored_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Asset ids passed to `destroy`, in call order.
    pub async fn destroyed(&self) -> Vec<String> {
        self.destroyed.read().await.clone()
    }
}

#[async_trait]
impl ImageHost for MemoryImageHost {
    async fn upload(&self, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        if self.fail_upload {
            anyhow::bail!("image host unavailable");
        }
        let id = Uuid::new_v4().to_string();
        let url = format!("{}/books/{}", self.marker, id);
        self.objects
            .write()
            .await
            .insert(id, (content_type.to_string(), body));
        Ok(url)
    }

    async fn destroy(&self, asset_id: &str) -> anyhow::Result<()> {
        self.destroyed.write().await.push(asset_id.to_string());
        if self.fail_destroy {
            anyhow::bail!("image host unavailable");
        }
        self.objects.write().await.remove(asset_id);
        Ok(())
    }

    fn marker(&self) -> &str {
        &self.marker
    }
}
