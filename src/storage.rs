use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::ImageHostConfig;

/// Remote image hosting. Assets are addressed by an opaque id that is also the
/// last path segment of their public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn upload(&self, body: Bytes, content_type: &str) -> anyhow::Result<String>;
    async fn destroy(&self, asset_id: &str) -> anyhow::Result<()>;
    /// Substring present in every URL this host hands out.
    fn marker(&self) -> &str;
}

#[derive(Clone)]
pub struct S3ImageHost {
    client: Client,
    bucket: String,
    public_base_url: String,
    key_prefix: String,
}

impl S3ImageHost {
    pub async fn new(cfg: &ImageHostConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base_url: cfg.public_base_url.clone(),
            key_prefix: cfg.key_prefix.clone(),
        })
    }

    fn key_for(&self, asset_id: &str) -> String {
        format!("{}/{}", self.key_prefix, asset_id)
    }
}

#[async_trait]
impl ImageHost for S3ImageHost {
    async fn upload(&self, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        let asset_id = Uuid::new_v4().to_string();
        let key = self.key_for(&asset_id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {}", key))?;
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn destroy(&self, asset_id: &str) -> anyhow::Result<()> {
        let key = self.key_for(asset_id);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {}", key))?;
        Ok(())
    }

    fn marker(&self) -> &str {
        &self.public_base_url
    }
}

pub fn is_managed(url: &str, marker: &str) -> bool {
    !marker.is_empty() && url.contains(marker)
}

/// Last path segment of `url` with any extension stripped.
pub fn asset_id_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next()?;
    let id = last.split('.').next()?;
    (!id.is_empty()).then_some(id)
}
