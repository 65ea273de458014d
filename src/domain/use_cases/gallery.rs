use serde::Serialize;
use validator::Validate;

use crate::{
    entities::{image::{Image, NewImage, SubmitImageForm}, server::Server},
    errors::AppError,
    repositories::image::ImageRepository,
    utils::sanitize::sanitize_image_url,
};

pub const BROWSE_PAGE_SIZE: u32 = 50;

#[derive(Debug, Serialize)]
pub struct BrowsePage {
    pub page: u32,
    pub prev: Option<u32>,
    /// `None` once `page` is the last addressable page.
    pub next: Option<u32>,
    pub images: Vec<Image>,
}

/// Request-scoped gallery operations. Built per request around a repository
/// bound to that request.
pub struct GalleryHandler<R>
where
    R: ImageRepository,
{
    pub repo: R,
}

impl<R> GalleryHandler<R>
where
    R: ImageRepository,
{
    pub fn new(repo: R) -> Self {
        GalleryHandler { repo }
    }

    /// Lists one page of live images. `raw_page` defaults to the first page.
    pub async fn browse(&self, raw_page: Option<&str>) -> Result<BrowsePage, AppError> {
        let page = parse_page(raw_page)?;
        let images = self.repo.load_images(BROWSE_PAGE_SIZE, page).await?;

        Ok(BrowsePage {
            page,
            prev: page.checked_sub(1).filter(|p| *p > 0),
            next: page.checked_add(1),
            images,
        })
    }

    /// Location of a randomly chosen image detail page.
    pub async fn random_image_location(&self) -> Result<String, AppError> {
        let id = self.repo.random_image_id().await?;
        Ok(format!("/images/{}", id))
    }

    /// Sanitizes and validates a submitted url, then saves it.
    pub async fn submit_image(&self, form: SubmitImageForm) -> Result<Image, AppError> {
        let form = SubmitImageForm {
            image_url: sanitize_image_url(&form.image_url),
        };
        form.validate()?;

        self.repo.save_image(&NewImage::new(form.image_url)).await
    }

    pub async fn show_image(&self, raw_id: &str) -> Result<Image, AppError> {
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| AppError::InvalidInput(format!("Invalid image id: {}", raw_id)))?;

        self.repo.find_image_by_id(id).await
    }

    pub async fn list_servers(&self) -> Result<Vec<Server>, AppError> {
        self.repo.load_servers().await
    }
}

/// Parses the `rawPage` query value. Pages are 1-based.
pub fn parse_page(raw_page: Option<&str>) -> Result<u32, AppError> {
    match raw_page.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(1),
        Some(raw) => match raw.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(AppError::InvalidInput(format!("Invalid page: {}", raw))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::{mock, predicate::*};

    use crate::entities::entity::Entity;

    mock! {
        pub ImageRepo {}

        #[async_trait]
        impl ImageRepository for ImageRepo {
            async fn load_servers(&self) -> Result<Vec<Server>, AppError>;
            async fn find_image_by_id(&self, id: i64) -> Result<Image, AppError>;
            async fn random_image_id(&self) -> Result<i64, AppError>;
            async fn load_images(&self, count: u32, page: u32) -> Result<Vec<Image>, AppError>;
            async fn save_image(&self, image: &NewImage) -> Result<Image, AppError>;
        }
    }

    fn image(id: i64, url: &str) -> Image {
        Image {
            id,
            url: url.to_string(),
            server_id: None,
            entity: Entity::new(Utc::now()),
        }
    }

    #[test]
    fn parse_page_defaults_to_first_page() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some("")).unwrap(), 1);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
    }

    #[test]
    fn parse_page_rejects_zero_and_garbage() {
        assert!(matches!(parse_page(Some("0")), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_page(Some("-2")), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_page(Some("two")), Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn browse_requests_fifty_per_page() {
        let mut repo = MockImageRepo::new();
        repo.expect_load_images()
            .with(eq(BROWSE_PAGE_SIZE), eq(2))
            .times(1)
            .returning(|_, _| Ok(vec![image(7, "http://example.com/a.png")]));

        let page = GalleryHandler::new(repo).browse(Some("2")).await.unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.prev, Some(1));
        assert_eq!(page.next, Some(3));
        assert_eq!(page.images.len(), 1);
    }

    #[tokio::test]
    async fn first_page_has_no_previous_page() {
        let mut repo = MockImageRepo::new();
        repo.expect_load_images()
            .with(eq(BROWSE_PAGE_SIZE), eq(1))
            .returning(|_, _| Ok(vec![]));

        let page = GalleryHandler::new(repo).browse(None).await.unwrap();
        assert_eq!(page.prev, None);
        assert!(page.images.is_empty());
    }

    #[tokio::test]
    async fn last_addressable_page_has_no_next_page() {
        let mut repo = MockImageRepo::new();
        repo.expect_load_images()
            .with(eq(BROWSE_PAGE_SIZE), eq(u32::MAX))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let page = GalleryHandler::new(repo)
            .browse(Some("4294967295"))
            .await
            .unwrap();

        assert_eq!(page.page, u32::MAX);
        assert_eq!(page.prev, Some(u32::MAX - 1));
        assert_eq!(page.next, None);
        assert!(page.images.is_empty());
    }

    #[tokio::test]
    async fn random_location_points_at_detail_page() {
        let mut repo = MockImageRepo::new();
        repo.expect_random_image_id().returning(|| Ok(42));

        let location = GalleryHandler::new(repo).random_image_location().await.unwrap();
        assert_eq!(location, "/images/42");
    }

    #[tokio::test]
    async fn random_location_propagates_empty_collection() {
        let mut repo = MockImageRepo::new();
        repo.expect_random_image_id().returning(|| Err(AppError::EmptyCollection));

        let err = GalleryHandler::new(repo).random_image_location().await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCollection));
    }

    #[tokio::test]
    async fn submit_saves_the_sanitized_url() {
        let mut repo = MockImageRepo::new();
        repo.expect_save_image()
            .withf(|new| new.url == "http://example.com/a.png" && new.server_id.is_none())
            .times(1)
            .returning(|new| Ok(image(1, &new.url)));

        let form = SubmitImageForm {
            image_url: "<i>http://example.com/a.png</i>".to_string(),
        };
        let saved = GalleryHandler::new(repo).submit_image(form).await.unwrap();
        assert_eq!(saved.url, "http://example.com/a.png");
    }

    #[tokio::test]
    async fn submit_rejects_invalid_urls_without_touching_storage() {
        let mut repo = MockImageRepo::new();
        repo.expect_save_image().never();

        let form = SubmitImageForm {
            image_url: "javascript:alert(1)".to_string(),
        };
        let err = GalleryHandler::new(repo).submit_image(form).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn show_image_rejects_non_numeric_ids() {
        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id().never();

        let err = GalleryHandler::new(repo).show_image("abc").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn show_image_looks_up_by_id() {
        let mut repo = MockImageRepo::new();
        repo.expect_find_image_by_id()
            .with(eq(9))
            .returning(|id| Ok(image(id, "http://example.com/9.png")));

        let found = GalleryHandler::new(repo).show_image("9").await.unwrap();
        assert_eq!(found.id, 9);
    }
}
