use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::BookWithAuthorRow;

/// Rating as sent by clients: a number (`4` or `4.0`) or a numeric string.
/// Anything else lands in `Other` so validation can reject it with a proper message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RatingInput {
    /// Zero or blank, what clients send when nothing was picked.
    pub fn is_blank(&self) -> bool {
        match self {
            RatingInput::Number(n) => *n == 0.0,
            RatingInput::Text(s) => s.trim().is_empty(),
            RatingInput::Other(v) => v.is_null(),
        }
    }

    /// The rating as an integer, if it is a finite whole number.
    pub fn as_whole(&self) -> Option<i64> {
        let n = match self {
            RatingInput::Number(n) => *n,
            RatingInput::Text(s) => s.trim().parse::<f64>().ok()?,
            RatingInput::Other(_) => return None,
        };
        (n.is_finite() && n.fract() == 0.0).then_some(n as i64)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub rating: Option<RatingInput>,
    /// `data:<mime>;base64,<payload>`
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub username: String,
    pub profile_image: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListItem {
    pub id: Uuid,
    pub title: String,
    pub caption: String,
    pub rating: i32,
    pub image: String,
    pub user: Author,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<BookWithAuthorRow> for BookListItem {
    fn from(r: BookWithAuthorRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            caption: r.caption,
            rating: r.rating,
            image: r.image,
            user: Author {
                username: r.username,
                profile_image: r.profile_image,
            },
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksPage {
    pub books: Vec<BookListItem>,
    pub current_page: i64,
    pub total_books: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
