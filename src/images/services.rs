use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::storage::{asset_id_from_url, is_managed, ImageHost};

/// A decoded `data:<mime>;base64,<payload>` image.
#[derive(Debug)]
pub struct InlineImage {
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InlineImageError {
    #[error("image must be a base64 data URL")]
    NotDataUrl,
    #[error("unsupported image type {0}")]
    UnsupportedType(String),
    #[error("image payload is not valid base64")]
    BadPayload,
    #[error("image payload is empty")]
    Empty,
}

pub fn decode_inline_image(raw: &str) -> Result<InlineImage, InlineImageError> {
    let rest = raw
        .trim()
        .strip_prefix("data:")
        .ok_or(InlineImageError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(InlineImageError::NotDataUrl)?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or(InlineImageError::NotDataUrl)?
        .to_ascii_lowercase();

    if ext_from_mime(&content_type).is_none() {
        return Err(InlineImageError::UnsupportedType(content_type));
    }

    // Some clients wrap long payloads.
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let body = Base64::decode_vec(&cleaned).map_err(|_| InlineImageError::BadPayload)?;
    if body.is_empty() {
        return Err(InlineImageError::Empty);
    }

    Ok(InlineImage {
        content_type,
        body: Bytes::from(body),
    })
}

pub async fn upload_inline_image(host: &dyn ImageHost, image: InlineImage) -> anyhow::Result<String> {
    let size = image.body.len();
    let url = host.upload(image.body, &image.content_type).await?;
    info!(%url, size, content_type = %image.content_type, "image uploaded");
    Ok(url)
}

/// Removes the hosted asset behind `url` if it belongs to `host`.
/// Returns whether a remote delete was attempted. Failures are logged, never returned.
pub async fn destroy_if_managed(host: &dyn ImageHost, url: &str) -> bool {
    if !is_managed(url, host.marker()) {
        debug!(%url, "image not hosted by us, skipping remote delete");
        return false;
    }
    let Some(asset_id) = asset_id_from_url(url) else {
        warn!(%url, "could not derive asset id from image url");
        return false;
    };
    if let Err(e) = host.destroy(asset_id).await {
        warn!(error = ?e, %asset_id, "error deleting image from image host");
    }
    true
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::memory::MemoryImageHost;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn decodes_data_url() {
        let img = decode_inline_image("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(img.content_type, "image/png");
        assert_eq!(&img.body[..], b"hello");
    }

    #[test]
    fn rejects_bad_inline_images() {
        assert_eq!(
            decode_inline_image("aGVsbG8=").unwrap_err(),
            InlineImageError::NotDataUrl
        );
        assert_eq!(
            decode_inline_image("data:text/plain;base64,aGVsbG8=").unwrap_err(),
            InlineImageError::UnsupportedType("text/plain".into())
        );
        assert_eq!(
            decode_inline_image("data:image/png;base64,@@@").unwrap_err(),
            InlineImageError::BadPayload
        );
        assert_eq!(
            decode_inline_image("data:image/png;base64,").unwrap_err(),
            InlineImageError::Empty
        );
    }

    #[tokio::test]
    async fn upload_then_destroy_managed_url() {
        let host = MemoryImageHost::new("https://images.local/fake");
        let img = decode_inline_image("data:image/jpeg;base64,aGVsbG8=").unwrap();
        let url = upload_inline_image(&host, img).await.unwrap();
        assert!(url.starts_with("https://images.local/fake/"));
        assert_eq!(host.stored_count().await, 1);

        assert!(destroy_if_managed(&host, &url).await);
        assert_eq!(host.stored_count().await, 0);
    }

    #[tokio::test]
    async fn foreign_url_is_not_destroyed() {
        let host = MemoryImageHost::new("https://images.local/fake");
        assert!(!destroy_if_managed(&host, "https://cdn.other.com/a.png").await);
        assert!(host.destroyed().await.is_empty());
    }

    #[tokio::test]
    async fn destroy_failure_is_swallowed() {
        let host = MemoryImageHost::new("https://images.local/fake").failing_destroy();
        assert!(destroy_if_managed(&host, "https://images.local/fake/books/zzz").await);
    }
}
