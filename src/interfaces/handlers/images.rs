use actix_web::{http::header, web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{entities::image::SubmitImageForm, errors::AppError, use_cases::extractors::Gallery};

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(rename = "rawPage")]
    pub raw_page: Option<String>,
}

#[instrument(skip(gallery, query))]
pub async fn browse_images(
    gallery: Gallery,
    query: web::Query<BrowseQuery>,
) -> Result<impl Responder, AppError> {
    let page = gallery.browse(query.raw_page.as_deref()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(gallery))]
pub async fn random_image(gallery: Gallery) -> Result<impl Responder, AppError> {
    let location = gallery.random_image_location().await?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish())
}

#[instrument(skip(gallery, form))]
pub async fn submit_image(
    gallery: Gallery,
    form: web::Form<SubmitImageForm>,
) -> Result<impl Responder, AppError> {
    let image = gallery.submit_image(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(image))
}

#[instrument(skip(gallery, image_id))]
pub async fn show_image(
    gallery: Gallery,
    image_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let image = gallery.show_image(&image_id).await?;
    Ok(HttpResponse::Ok().json(image))
}
