use actix_web::web;

use crate::{handlers::console, middlewares::basic_auth::ConsoleAuth};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/console")
            .wrap(ConsoleAuth)
            .service(
                web::resource("/servers")
                    .route(web::get().to(console::list_servers))
            )
    );
}
