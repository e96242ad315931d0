use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// S3-compatible bucket holding review images.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageHostConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Public URL prefix of the bucket. URLs containing it are ours to delete.
    pub public_base_url: String,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeepAliveConfig {
    pub url: String,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs against the in-process store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub images: ImageHostConfig,
    pub keep_alive: Option<KeepAliveConfig>,
}

/// 15 days.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15 * 24 * 60;

/// 14 minutes, just under the idle timeout of most free hosting tiers.
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 14 * 60;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("APP_PORT"))
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bookworm".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bookworm-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES),
        };

        let endpoint = std::env::var("S3_ENDPOINT")?;
        let bucket = std::env::var("S3_BUCKET")?;
        let public_base_url = std::env::var("IMAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let images = ImageHostConfig {
            endpoint,
            bucket,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            key_prefix: std::env::var("IMAGE_KEY_PREFIX").unwrap_or_else(|_| "books".into()),
        };

        let keep_alive = std::env::var("KEEPALIVE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|url| KeepAliveConfig {
                url,
                interval_secs: std::env::var("KEEPALIVE_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL_SECS),
            });

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            jwt,
            images,
            keep_alive,
        })
    }

    /// Config used by `AppState::fake()`.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            },
            images: ImageHostConfig {
                endpoint: "http://images.local".into(),
                bucket: "fake".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                region: "us-east-1".into(),
                public_base_url: "https://images.local/fake".into(),
                key_prefix: "books".into(),
            },
            keep_alive: None,
        }
    }
}
