use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::{
    entities::{image::{Image, NewImage}, server::Server},
    errors::{is_transaction_conflict, AppError},
    repositories::sqlx_repo::SqlxImageRepo,
};

const IMAGE_COLUMNS: &str = "id, url, server_id, created_at, updated_at, deleted_at, is_deleted";
const SERVER_COLUMNS: &str = "id, url, created_at, updated_at, deleted_at, is_deleted";
const INITIAL_RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Storage contract consumed by the request handlers.
///
/// An implementation is bound to a single request: each call opens and closes
/// its own interaction with the backend and must not rely on state left over
/// from a previous call.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// All servers, most recently updated first.
    async fn load_servers(&self) -> Result<Vec<Server>, AppError>;

    /// Point lookup. Soft-deleted images are still returned.
    async fn find_image_by_id(&self, id: i64) -> Result<Image, AppError>;

    /// Id of one image drawn uniformly from the whole collection, deleted or
    /// not. Fails with `EmptyCollection` when there are no images.
    async fn random_image_id(&self) -> Result<i64, AppError>;

    /// One page of non-deleted images, newest first. `page` is 1-based.
    async fn load_images(&self, count: u32, page: u32) -> Result<Vec<Image>, AppError>;

    /// Persists a new image unless any image already uses the same url.
    async fn save_image(&self, image: &NewImage) -> Result<Image, AppError>;
}

#[async_trait]
impl<R> ImageRepository for Box<R>
where
    R: ImageRepository + ?Sized,
{
    async fn load_servers(&self) -> Result<Vec<Server>, AppError> {
        (**self).load_servers().await
    }

    async fn find_image_by_id(&self, id: i64) -> Result<Image, AppError> {
        (**self).find_image_by_id(id).await
    }

    async fn random_image_id(&self) -> Result<i64, AppError> {
        (**self).random_image_id().await
    }

    async fn load_images(&self, count: u32, page: u32) -> Result<Vec<Image>, AppError> {
        (**self).load_images(count, page).await
    }

    async fn save_image(&self, image: &NewImage) -> Result<Image, AppError> {
        (**self).save_image(image).await
    }
}

/// Helper to compute OFFSET safely from 1-based `page` and `per_page`.
pub fn page_offset(page: u32, per_page: u32) -> i64 {
    let page = page.saturating_sub(1);
    (page as i64) * (per_page as i64)
}

enum SaveOutcome {
    Saved(Image),
    Duplicate,
}

impl SqlxImageRepo {
    /// One attempt at the count-then-insert transaction. Runs under
    /// SERIALIZABLE so two writers racing on the same url cannot both commit;
    /// the loser gets a serialization failure and is retried by the caller.
    async fn try_save_image(&self, image: &NewImage) -> Result<SaveOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images WHERE url = $1")
            .bind(&image.url)
            .fetch_one(&mut *tx)
            .await?;

        if existing > 0 {
            tx.rollback().await?;
            return Ok(SaveOutcome::Duplicate);
        }

        let now = Utc::now();
        let saved = sqlx::query_as::<_, Image>(&format!(
            r#"
            INSERT INTO images (url, server_id, created_at, updated_at, deleted_at, is_deleted)
            VALUES ($1, $2, $3, $3, NULL, FALSE)
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(&image.url)
        .bind(image.server_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SaveOutcome::Saved(saved))
    }
}

#[async_trait]
impl ImageRepository for SqlxImageRepo {
    async fn load_servers(&self) -> Result<Vec<Server>, AppError> {
        self.ctx.run("load_servers", async {
            let servers = sqlx::query_as::<_, Server>(&format!(
                "SELECT {SERVER_COLUMNS} FROM servers ORDER BY updated_at DESC"
            ))
            .fetch_all(&self.pool)
            .await?;

            Ok::<_, AppError>(servers)
        })
        .await
    }

    async fn find_image_by_id(&self, id: i64) -> Result<Image, AppError> {
        self.ctx.run("find_image_by_id", async {
            let image = sqlx::query_as::<_, Image>(&format!(
                "SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            image.ok_or_else(|| AppError::NotFound(format!("Image {}", id)))
        })
        .await
    }

    async fn random_image_id(&self) -> Result<i64, AppError> {
        self.ctx.run("random_image_id", async {
            // Count and offset read the same snapshot, so a concurrent insert or
            // delete cannot push the offset past the end of the table.
            let mut tx = self.pool.begin().await?;

            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                .execute(&mut *tx)
                .await?;

            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images")
                .fetch_one(&mut *tx)
                .await?;

            if total == 0 {
                tx.commit().await?;
                return Err(AppError::EmptyCollection);
            }

            let index = rand::thread_rng().gen_range(0..total);

            // OFFSET is skip-and-discard: O(total) per call.
            let id: Option<i64> = sqlx::query_scalar("SELECT id FROM images ORDER BY id OFFSET $1 LIMIT 1")
                .bind(index)
                .fetch_optional(&mut *tx)
                .await?;

            tx.commit().await?;

            tracing::debug!(request_id = %self.ctx.request_id(), total, index, "Sampled random image");

            id.ok_or(AppError::EmptyCollection)
        })
        .await
    }

    async fn load_images(&self, count: u32, page: u32) -> Result<Vec<Image>, AppError> {
        self.ctx.run("load_images", async {
            let images = sqlx::query_as::<_, Image>(&format!(
                r#"
                SELECT {IMAGE_COLUMNS}
                FROM images
                WHERE is_deleted = FALSE
                ORDER BY created_at DESC, id DESC
                LIMIT $1 OFFSET $2
                "#
            ))
            .bind(count as i64)
            .bind(page_offset(page, count))
            .fetch_all(&self.pool)
            .await?;

            Ok::<_, AppError>(images)
        })
        .await
    }

    async fn save_image(&self, image: &NewImage) -> Result<Image, AppError> {
        self.ctx.run("save_image", async {
            let mut attempt = 0;
            let mut backoff = INITIAL_RETRY_BACKOFF;

            loop {
                match self.try_save_image(image).await {
                    Ok(SaveOutcome::Saved(saved)) => {
                        tracing::info!(
                            request_id = %self.ctx.request_id(),
                            image_id = saved.id,
                            "Image saved"
                        );
                        return Ok(saved);
                    }
                    Ok(SaveOutcome::Duplicate) => {
                        return Err(AppError::DuplicateUrl(image.url.clone()));
                    }
                    Err(e) if is_transaction_conflict(&e) && attempt < self.save_retry_attempts => {
                        attempt += 1;
                        tracing::warn!(
                            request_id = %self.ctx.request_id(),
                            "Transaction conflict while saving image (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, self.save_retry_attempts, e, backoff
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                    Err(e) => return Err(AppError::from(e)),
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(page_offset(1, 50), 0);
        assert_eq!(page_offset(2, 50), 50);
        assert_eq!(page_offset(3, 10), 20);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        assert_eq!(page_offset(0, 50), 0);
    }
}
