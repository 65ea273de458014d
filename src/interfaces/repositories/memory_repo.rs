use std::{collections::{HashMap, HashSet}, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;

use crate::{
    entities::{entity::Entity, image::{Image, NewImage}, server::Server},
    errors::AppError,
    repositories::{context::RequestContext, image::{page_offset, ImageRepository}},
};

#[derive(Default)]
struct Tables {
    images: HashMap<i64, Image>,
    /// Every image id in insertion order; dense, so sampling is one index lookup.
    image_ids: Vec<i64>,
    /// Urls of every stored image, deleted or not.
    urls: HashSet<String>,
    servers: Vec<Server>,
    next_image_id: i64,
    next_server_id: i64,
}

impl Tables {
    fn insert_image(&mut self, image: &NewImage, entity: Entity) -> Result<Image, AppError> {
        if self.urls.contains(&image.url) {
            return Err(AppError::DuplicateUrl(image.url.clone()));
        }

        self.next_image_id += 1;
        let saved = Image {
            id: self.next_image_id,
            url: image.url.clone(),
            server_id: image.server_id,
            entity,
        };

        self.urls.insert(saved.url.clone());
        self.image_ids.push(saved.id);
        self.images.insert(saved.id, saved.clone());

        Ok(saved)
    }
}

/// Process-local storage backend. The write lock plays the role of the
/// backend transaction: the uniqueness check and the insert happen under it.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an upload server. Servers have no write path through the
    /// repository, so fixtures and operators load them here.
    pub fn seed_server(&self, url: impl Into<String>, updated_at: DateTime<Utc>) -> Server {
        let mut tables = self.tables.write();
        tables.next_server_id += 1;

        let server = Server {
            id: tables.next_server_id,
            url: url.into(),
            entity: Entity::new(updated_at),
        };
        tables.servers.push(server.clone());
        server
    }

    /// Loads an image with explicit lifecycle fields (e.g. an already
    /// soft-deleted record). The url uniqueness rule still applies.
    pub fn seed_image(&self, image: &NewImage, entity: Entity) -> Result<Image, AppError> {
        self.tables.write().insert_image(image, entity)
    }

    pub fn image_count(&self) -> usize {
        self.tables.read().image_ids.len()
    }
}

/// In-memory repository bound to one request.
#[derive(Clone)]
pub struct InMemoryImageRepo {
    pub store: Arc<MemoryStore>,
    pub ctx: RequestContext,
}

impl InMemoryImageRepo {
    pub fn new(store: Arc<MemoryStore>, ctx: RequestContext) -> Self {
        InMemoryImageRepo { store, ctx }
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepo {
    async fn load_servers(&self) -> Result<Vec<Server>, AppError> {
        self.ctx.run("load_servers", async {
            let mut servers = self.store.tables.read().servers.clone();
            servers.sort_by(|a, b| b.entity.updated_at.cmp(&a.entity.updated_at));
            Ok::<_, AppError>(servers)
        })
        .await
    }

    async fn find_image_by_id(&self, id: i64) -> Result<Image, AppError> {
        self.ctx.run("find_image_by_id", async {
            self.store
                .tables
                .read()
                .images
                .get(&id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Image {}", id)))
        })
        .await
    }

    async fn random_image_id(&self) -> Result<i64, AppError> {
        self.ctx.run("random_image_id", async {
            let tables = self.store.tables.read();
            if tables.image_ids.is_empty() {
                return Err(AppError::EmptyCollection);
            }

            let index = rand::thread_rng().gen_range(0..tables.image_ids.len());
            Ok(tables.image_ids[index])
        })
        .await
    }

    async fn load_images(&self, count: u32, page: u32) -> Result<Vec<Image>, AppError> {
        self.ctx.run("load_images", async {
            let tables = self.store.tables.read();

            let mut live: Vec<&Image> = tables
                .images
                .values()
                .filter(|image| !image.entity.is_deleted)
                .collect();
            live.sort_by(|a, b| {
                b.entity.created_at
                    .cmp(&a.entity.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });

            let offset = page_offset(page, count) as usize;
            let images: Vec<Image> = live
                .into_iter()
                .skip(offset)
                .take(count as usize)
                .cloned()
                .collect();

            Ok::<_, AppError>(images)
        })
        .await
    }

    async fn save_image(&self, image: &NewImage) -> Result<Image, AppError> {
        self.ctx.run("save_image", async {
            let saved = self
                .store
                .tables
                .write()
                .insert_image(image, Entity::new(Utc::now()))?;

            tracing::info!(
                request_id = %self.ctx.request_id(),
                image_id = saved.id,
                "Image saved"
            );
            Ok::<_, AppError>(saved)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn repo(store: &Arc<MemoryStore>) -> InMemoryImageRepo {
        InMemoryImageRepo::new(store.clone(), RequestContext::new(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = Arc::new(MemoryStore::new());
        let repo = repo(&store);

        let a = repo.save_image(&NewImage::new("http://example.com/a.png")).await.unwrap();
        let b = repo.save_image(&NewImage::new("http://example.com/b.png")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.image_count(), 2);
    }

    #[tokio::test]
    async fn save_stamps_lifecycle_fields() {
        let store = Arc::new(MemoryStore::new());
        let before = Utc::now();

        let saved = repo(&store)
            .save_image(&NewImage::new("http://example.com/a.png").hosted_on(3))
            .await
            .unwrap();

        assert!(saved.entity.created_at >= before);
        assert_eq!(saved.entity.created_at, saved.entity.updated_at);
        assert!(!saved.entity.is_deleted);
        assert!(saved.entity.deleted_at.is_none());
        assert_eq!(saved.server_id, Some(3));
    }

    #[tokio::test]
    async fn seeded_duplicates_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        let new = NewImage::new("http://example.com/a.png");

        store.seed_image(&new, Entity::new(Utc::now())).unwrap();
        let err = store.seed_image(&new, Entity::new(Utc::now())).unwrap_err();

        assert!(matches!(err, AppError::DuplicateUrl(url) if url == "http://example.com/a.png"));
    }
}
