use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Book review record. Serialized as-is for create and the owner's own list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid, // owner, fixed at creation
    pub title: String,
    pub caption: String,
    pub rating: i32,
    pub image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Book joined with the few owner fields the public feed shows.
#[derive(Debug, Clone, FromRow)]
pub struct BookWithAuthorRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub caption: String,
    pub rating: i32,
    pub image: String,
    pub created_at: OffsetDateTime,
    pub username: String,
    pub profile_image: String,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub user_id: Uuid,
    pub title: String,
    pub caption: String,
    pub rating: i32,
    pub image: String,
}
