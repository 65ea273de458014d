use actix_web::web;

use crate::handlers::images;

pub fn config_gallery_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/browse").route(web::get().to(images::browse_images)))
        .service(web::resource("/g").route(web::get().to(images::random_image)));
}

/// Mounted under `/images`.
pub fn config_image_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::post().to(images::submit_image))
    )
    .service(
        web::resource("/{image_id}")
            .route(web::get().to(images::show_image))
    );
}
