use std::ops::Deref;

use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{
    errors::AppError,
    repositories::{context::RequestContext, image::ImageRepository},
    use_cases::gallery::GalleryHandler,
    AppState,
};

/// Extractor that builds a gallery over a repository scoped to the current request.
/// Usage: Add `gallery: Gallery` as a parameter to your handler function.
pub struct Gallery(pub GalleryHandler<Box<dyn ImageRepository>>);

impl FromRequest for Gallery {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.app_data::<web::Data<AppState>>() {
            Some(state) => {
                let ctx = RequestContext::new(state.request_timeout);
                tracing::debug!(request_id = %ctx.request_id(), path = req.path(), "Scoped repository");
                ready(Ok(Gallery(GalleryHandler::new(state.provider.scoped(ctx)))))
            }
            None => {
                tracing::error!("AppState missing in gallery extractor");
                ready(Err(AppError::StorageError("application state missing".into()).into()))
            }
        }
    }
}

impl Deref for Gallery {
    type Target = GalleryHandler<Box<dyn ImageRepository>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
