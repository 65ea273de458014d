use actix_web::web;

use crate::{
    handlers::{home::home, system::health_check},
    middlewares::cors::images_cors,
};

mod console;
mod images;
mod payload_errors;

/// Registers every route. `cors_origins` applies to the `/images` scope.
pub fn configure_routes(cors_origins: Vec<String>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(home);
        cfg.service(health_check);

        cfg.configure(images::config_gallery_routes);
        cfg.service(
            web::scope("/images")
                .wrap(images_cors(&cors_origins))
                .configure(images::config_image_routes)
        );
        cfg.configure(console::config_routes);

        cfg.configure(payload_errors::config_routes);
    }
}
