use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{BooksPage, CreateBookRequest, ListBooksQuery, RatingInput},
    repo::BookStore,
    repo_types::{Book, NewBook},
};
use crate::{
    error::{ApiError, ApiResult},
    images::services::{decode_inline_image, destroy_if_managed, upload_inline_image},
    storage::ImageHost,
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 2;
pub const MAX_LIMIT: i64 = 50;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Offset/limit window over the newest-first book feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Absent or empty values take the defaults. `limit` is clamped to `MAX_LIMIT`,
    /// so page size and `totalPages` follow the clamped value, not the requested one.
    pub fn from_query(q: &ListBooksQuery) -> ApiResult<Self> {
        let page = parse_positive("page", q.page.as_deref())?.unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive("limit", q.limit.as_deref())?
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> ApiResult<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(Some(i64::from(n))),
        _ => Err(ApiError::Validation(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

fn rating_value(rating: &RatingInput) -> ApiResult<i32> {
    rating
        .as_whole()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .map(|r| r as i32)
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Rating must be a whole number between {} and {}",
                MIN_RATING, MAX_RATING
            ))
        })
}

pub async fn create_book(
    books: &dyn BookStore,
    images: &dyn ImageHost,
    user_id: Uuid,
    req: CreateBookRequest,
) -> ApiResult<Book> {
    let rating = req.rating.filter(|r| !r.is_blank());
    let (Some(title), Some(caption), Some(rating), Some(image)) = (
        present(req.title),
        present(req.caption),
        rating,
        present(req.image),
    ) else {
        return Err(ApiError::Validation("All fields are required".into()));
    };

    let rating = rating_value(&rating)?;
    let image = decode_inline_image(&image)
        .map_err(|e| ApiError::Validation(format!("Invalid image: {}", e)))?;

    let image_url = upload_inline_image(images, image)
        .await
        .map_err(ApiError::Upload)?;

    let book = books
        .insert(NewBook {
            user_id,
            title,
            caption,
            rating,
            image: image_url,
        })
        .await?;

    info!(book_id = %book.id, user_id = %user_id, "book created");
    Ok(book)
}

pub async fn list_books(books: &dyn BookStore, page: PageRequest) -> ApiResult<BooksPage> {
    let rows = books.page(page.limit, page.offset()).await?;
    let total = books.count().await?;

    Ok(BooksPage {
        books: rows.into_iter().map(Into::into).collect(),
        current_page: page.page,
        total_books: total,
        total_pages: total_pages(total, page.limit),
    })
}

pub async fn list_user_books(books: &dyn BookStore, user_id: Uuid) -> ApiResult<Vec<Book>> {
    Ok(books.list_by_user(user_id).await?)
}

pub async fn delete_book(
    books: &dyn BookStore,
    images: &dyn ImageHost,
    user_id: Uuid,
    book_id: &str,
) -> ApiResult<()> {
    let not_found = || ApiError::NotFound("Book not found!".into());

    let id = Uuid::parse_str(book_id).map_err(|_| not_found())?;
    let book = books.find_by_id(id).await?.ok_or_else(not_found)?;

    if book.user_id != user_id {
        warn!(book_id = %id, owner = %book.user_id, user_id = %user_id, "delete by non-owner");
        return Err(ApiError::unauthorized());
    }

    destroy_if_managed(images, &book.image).await;

    if !books.delete(id).await? {
        return Err(not_found());
    }

    info!(book_id = %id, user_id = %user_id, "book deleted");
    Ok(())
}
