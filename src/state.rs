use std::sync::Arc;

use crate::{
    auth::repo::UserStore,
    books::repo::BookStore,
    config::AppConfig,
    db::PgStore,
    memory::{MemoryImageHost, MemoryStore},
    storage::{ImageHost, S3ImageHost},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub images: Arc<dyn ImageHost>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (users, books): (Arc<dyn UserStore>, Arc<dyn BookStore>) = match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url).await?);
                if let Err(e) = store.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                (store.clone() as Arc<dyn UserStore>, store as Arc<dyn BookStore>)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data will not persist");
                let store = Arc::new(MemoryStore::default());
                (store.clone() as Arc<dyn UserStore>, store as Arc<dyn BookStore>)
            }
        };

        let images = Arc::new(S3ImageHost::new(&config.images).await?) as Arc<dyn ImageHost>;

        Ok(Self {
            config,
            users,
            books,
            images,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        books: Arc<dyn BookStore>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            config,
            users,
            books,
            images,
        }
    }

    /// Fully in-process state: memory stores, memory image host, test config.
    pub fn fake() -> Self {
        let config = AppConfig::for_tests();
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(MemoryImageHost::new(config.images.public_base_url.clone()));
        Self::from_parts(Arc::new(config), store.clone(), store, images)
    }
}
